use uuid::Uuid;

use crate::{Error, Time, User, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub Uuid);

impl CommentId {
    pub fn stub() -> CommentId {
        CommentId(STUB_UUID)
    }
}

/// Reference to a parent comment as embedded in comment records.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ParentRef {
    #[serde(rename = "_id")]
    pub id: CommentId,
}

/// One comment record as returned by `GET /api/comments/{ticket}`.
///
/// The server's array order is authoritative for display ordering;
/// `created_at` is used for display only.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: CommentId,

    pub text: String,

    /// Server-side paths, resolved against the collaborator base URL
    #[serde(default)]
    pub attachments: Vec<String>,

    pub user: User,

    /// None marks a root (top-level) comment
    #[serde(rename = "parentComment", default)]
    pub parent_comment: Option<ParentRef>,

    #[serde(rename = "createdAt")]
    pub created_at: Time,

    #[serde(default)]
    pub likes: u64,
}

impl Comment {
    pub fn parent_id(&self) -> Option<CommentId> {
        self.parent_comment.map(|p| p.id)
    }
}

/// One `file` part of a multipart submission.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Payload for `POST /api/comments/{ticket}`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewComment {
    pub text: String,
    /// Some(_) makes this a reply, None a root comment
    pub parent: Option<CommentId>,
    pub files: Vec<FileUpload>,
}

impl NewComment {
    pub fn root(text: impl Into<String>, files: Vec<FileUpload>) -> NewComment {
        NewComment {
            text: text.into(),
            parent: None,
            files,
        }
    }

    pub fn reply(parent: CommentId, text: impl Into<String>, files: Vec<FileUpload>) -> NewComment {
        NewComment {
            text: text.into(),
            parent: Some(parent),
            files,
        }
    }

    /// Text may be empty only if at least one attachment is present.
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.text)?;
        if self.text.trim().is_empty() && self.files.is_empty() {
            return Err(Error::EmptyComment);
        }
        Ok(())
    }
}

/// Payload for `PUT /api/comments/{comment}`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentEdit {
    pub text: String,
    /// Additional attachments; existing ones are kept by the server
    pub files: Vec<FileUpload>,
}

impl CommentEdit {
    pub fn new(text: impl Into<String>, files: Vec<FileUpload>) -> CommentEdit {
        CommentEdit {
            text: text.into(),
            files,
        }
    }

    // Same rule as NewComment::validate
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.text)?;
        if self.text.trim().is_empty() && self.files.is_empty() {
            return Err(Error::EmptyComment);
        }
        Ok(())
    }
}
