use uuid::Uuid;

use crate::{Time, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct NotificationId(pub Uuid);

impl NotificationId {
    pub fn stub() -> NotificationId {
        NotificationId(STUB_UUID)
    }
}

/// One entry of the per-user notification feed.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: NotificationId,

    pub message: String,

    /// In-app route the notification points at
    #[serde(default)]
    pub link: Option<String>,

    #[serde(rename = "isRead", default)]
    pub is_read: bool,

    #[serde(rename = "createdAt")]
    pub created_at: Time,
}
