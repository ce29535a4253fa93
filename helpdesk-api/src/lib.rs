use chrono::Utc;

mod attachment;
pub use attachment::{attachment_file_name, attachment_kind, attachment_url, AttachmentKind};

mod auth;
pub use auth::AuthToken;

mod comment;
pub use comment::{Comment, CommentEdit, CommentId, FileUpload, NewComment, ParentRef};

mod error;
pub use error::Error;

mod feed;
pub use feed::{CommentNotice, FeedMessage, RoomRequest, TicketNotice};

mod notification;
pub use notification::{Notification, NotificationId};

mod store;
pub use store::{CommentsApi, NotificationsApi};

mod ticket;
pub use ticket::TicketId;

mod user;
pub use user::{User, UserId};

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

/// Strings are stored by collaborators that reject null bytes, so refuse them
/// before they ever hit the wire.
pub(crate) fn validate_string(s: &str) -> Result<(), Error> {
    match s.contains('\0') {
        true => Err(Error::NullByteInString(s.to_string())),
        false => Ok(()),
    }
}
