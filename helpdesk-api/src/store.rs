use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    Comment, CommentEdit, CommentId, Error, FeedMessage, NewComment, Notification, NotificationId,
    TicketId,
};

/// The external comments collaborator, as seen by the reconciler.
///
/// Implemented over HTTP + websocket for the real backend and in-memory by
/// the mock server for tests. Fetching returns the flat list in the server's
/// authoritative order; mutations return the server's record, but callers are
/// expected to re-fetch rather than trust it for display.
#[async_trait]
pub trait CommentsApi {
    async fn fetch_comments(&mut self, ticket: TicketId) -> Result<Vec<Comment>, Error>;

    async fn create_comment(
        &mut self,
        ticket: TicketId,
        comment: NewComment,
    ) -> Result<Comment, Error>;

    async fn edit_comment(
        &mut self,
        comment: CommentId,
        edit: CommentEdit,
    ) -> Result<Comment, Error>;

    async fn delete_comment(&mut self, comment: CommentId) -> Result<(), Error>;

    /// Subscribe to the per-ticket update channel. Must be balanced by
    /// exactly one `leave_ticket_room` when the view goes away.
    async fn join_ticket_room(
        &mut self,
        ticket: TicketId,
    ) -> Result<mpsc::UnboundedReceiver<FeedMessage>, Error>;

    async fn leave_ticket_room(&mut self, ticket: TicketId) -> Result<(), Error>;
}

/// The external notifications collaborator: the global per-user channel,
/// joined once at session start.
#[async_trait]
pub trait NotificationsApi {
    async fn fetch_notifications(&mut self) -> Result<Vec<Notification>, Error>;

    async fn mark_read(&mut self, notification: NotificationId) -> Result<(), Error>;

    async fn mark_all_read(&mut self) -> Result<(), Error>;

    async fn join_user_room(&mut self)
        -> Result<mpsc::UnboundedReceiver<Notification>, Error>;
}
