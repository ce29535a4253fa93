use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde_json::json;
use uuid::Uuid;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Unknown ticket {0}")]
    UnknownTicket(Uuid),

    #[error("Unknown comment {0}")]
    UnknownComment(Uuid),

    #[error("Comment has neither text nor attachment")]
    EmptyComment,

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::UnknownTicket(_) => StatusCode::NOT_FOUND,
            Error::UnknownComment(_) => StatusCode::NOT_FOUND,
            Error::EmptyComment => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message shown to the user when an operation fails. The failing
    /// operation is simply aborted; nothing here is fatal to the caller.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unknown(msg) if msg.is_empty() => String::from("Something went wrong"),
            _ => self.to_string(),
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::UnknownTicket(t) => json!({
                "message": "unknown ticket",
                "type": "unknown-ticket",
                "ticket": t,
            }),
            Error::UnknownComment(c) => json!({
                "message": "unknown comment",
                "type": "unknown-comment",
                "comment": c,
            }),
            Error::EmptyComment => json!({
                "message": "comment has neither text nor attachment",
                "type": "empty-comment",
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(String::from(
                    data.get("message")
                        .and_then(|msg| msg.as_str())
                        .unwrap_or(""),
                )),
                "permission-denied" => Error::PermissionDenied,
                "unknown-ticket" => Error::UnknownTicket(
                    data.get("ticket")
                        .and_then(|t| t.as_str())
                        .and_then(|t| Uuid::from_str(t).ok())
                        .ok_or_else(|| {
                            anyhow!("error is about an unknown ticket without a proper uuid")
                        })?,
                ),
                "unknown-comment" => Error::UnknownComment(
                    data.get("comment")
                        .and_then(|c| c.as_str())
                        .and_then(|c| Uuid::from_str(c).ok())
                        .ok_or_else(|| {
                            anyhow!("error is about an unknown comment without a proper uuid")
                        })?,
                ),
                "empty-comment" => Error::EmptyComment,
                "null-byte" => Error::NullByteInString(String::from(
                    data.get("string").and_then(|s| s.as_str()).ok_or_else(|| {
                        anyhow!("error is a null-byte-in-string without a string")
                    })?,
                )),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}
