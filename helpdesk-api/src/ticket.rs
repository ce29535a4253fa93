use crate::STUB_UUID;

use uuid::Uuid;

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct TicketId(pub Uuid);

impl TicketId {
    pub fn stub() -> TicketId {
        TicketId(STUB_UUID)
    }
}
