//! Shared setup for the cross-crate integration tests.

use std::sync::Arc;

use helpdesk_api::{TicketId, User, Uuid};
use helpdesk_mock_server::{MockApi, MockServer};
use tokio::sync::Mutex;

/// A fresh mock collaborator with one empty ticket.
pub fn server_with_ticket() -> (Arc<Mutex<MockServer>>, TicketId) {
    let mut server = MockServer::new();
    let ticket = TicketId(Uuid::new_v4());
    server.add_ticket(ticket);
    (Arc::new(Mutex::new(server)), ticket)
}

/// A collaborator handle authenticated as `name`.
pub fn api_as(server: &Arc<Mutex<MockServer>>, name: &str) -> MockApi {
    MockApi::new(server.clone(), User::stub(name))
}
