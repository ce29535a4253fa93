use crate::{CommentId, Notification, TicketId, UserId};

/// Outbound room-control frames for the live-update channel.
///
/// The per-ticket room is joined and left with the ticket view's lifecycle;
/// the per-user room is joined once at session start.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomRequest {
    JoinTicketRoom(TicketId),
    LeaveTicketRoom(TicketId),
    JoinUserRoom(UserId),
    LeaveUserRoom(UserId),
}

/// Push notice that a comment was created on some ticket.
///
/// Only the ticket reference is acted upon: a client viewing that ticket
/// re-fetches the full comment list instead of applying this payload, so
/// duplicate deliveries are harmless.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentNotice {
    pub ticket: TicketId,
    #[serde(rename = "_id", default)]
    pub comment: Option<CommentId>,
}

/// Push notice that a ticket record changed. Ticket state is outside the
/// comment reconciler; this is carried on the same channel and ignored here.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct TicketNotice {
    #[serde(rename = "_id")]
    pub ticket: TicketId,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedMessage {
    Pong,
    NewComment(CommentNotice),
    TicketUpdated(TicketNotice),
    NewNotification(Notification),
}
