use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use reqwest::multipart;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;

use crate::api::{
    AuthToken, Comment, CommentEdit, CommentId, CommentsApi, Error, FeedMessage, FileUpload,
    NewComment, Notification, NotificationId, NotificationsApi, RoomRequest, TicketId, UserId,
};

// Pings are sent every PING_INTERVAL_SECS; if no pong was seen for more than
// DISCONNECT_INTERVAL_SECS the connection is considered dead. Reconnect
// attempts are spaced by ATTEMPT_SPACING_SECS.
const PING_INTERVAL_SECS: u64 = 10;
const DISCONNECT_INTERVAL_SECS: u64 = 20;
const ATTEMPT_SPACING_SECS: u64 = 1;

/// The real collaborator: REST endpoints over `reqwest`, live updates over a
/// websocket feed task per joined room.
pub struct HttpApi {
    host: String,
    token: AuthToken,
    user: UserId,
    client: reqwest::Client,
    ticket_rooms: HashMap<TicketId, watch::Sender<bool>>,
    user_room: Option<watch::Sender<bool>>,
}

impl HttpApi {
    pub fn new(host: impl Into<String>, token: AuthToken, user: UserId) -> HttpApi {
        let mut host = host.into();
        while host.ends_with('/') {
            host.pop();
        }
        HttpApi {
            host,
            token,
            user,
            client: reqwest::Client::new(),
            ticket_rooms: HashMap::new(),
            user_room: None,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Base URL for resolving attachment paths.
    pub fn attachment_url(&self, path: &str) -> String {
        crate::api::attachment_url(&self.host, path)
    }

    fn ws_url(&self) -> Result<String, Error> {
        match self.host.strip_prefix("http") {
            Some(rest) => Ok(format!("ws{rest}/ws/update-feed")),
            None => Err(Error::Unknown(format!(
                "host {} is not an http(s) url",
                self.host
            ))),
        }
    }

    fn spawn_feed<T, F>(
        &self,
        join: RoomRequest,
        leave: RoomRequest,
        filter: F,
    ) -> Result<(mpsc::UnboundedReceiver<T>, watch::Sender<bool>), Error>
    where
        T: Send + 'static,
        F: Fn(FeedMessage) -> Option<T> + Send + 'static,
    {
        let ws_url = self.ws_url()?;
        let (events, receiver) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(run_feed(
            ws_url, self.token, join, leave, filter, events, cancel_rx,
        ));
        Ok((receiver, cancel_tx))
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    Error::Unknown(e.to_string())
}

/// 2xx passes through; anything else becomes the server's error when the body
/// carries the error envelope, or `Unknown` with the raw body otherwise.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.map_err(transport_error)?;
    Err(Error::parse(&body)
        .unwrap_or_else(|_| Error::Unknown(String::from_utf8_lossy(&body).into_owned())))
}

async fn expect_json<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    check_status(resp).await?.json().await.map_err(transport_error)
}

fn comment_form(text: String, parent: Option<CommentId>, files: Vec<FileUpload>) -> multipart::Form {
    let mut form = multipart::Form::new().text("text", text);
    if let Some(parent) = parent {
        form = form.text("parentComment", parent.0.to_string());
    }
    for f in files {
        form = form.part("file", multipart::Part::bytes(f.bytes).file_name(f.file_name));
    }
    form
}

#[async_trait]
impl CommentsApi for HttpApi {
    async fn fetch_comments(&mut self, ticket: TicketId) -> Result<Vec<Comment>, Error> {
        let resp = self
            .client
            .get(format!("{}/api/comments/{}", self.host, ticket.0))
            .bearer_auth(self.token.0)
            .send()
            .await
            .map_err(transport_error)?;
        expect_json(resp).await
    }

    async fn create_comment(
        &mut self,
        ticket: TicketId,
        comment: NewComment,
    ) -> Result<Comment, Error> {
        comment.validate()?;
        let resp = self
            .client
            .post(format!("{}/api/comments/{}", self.host, ticket.0))
            .bearer_auth(self.token.0)
            .multipart(comment_form(comment.text, comment.parent, comment.files))
            .send()
            .await
            .map_err(transport_error)?;
        expect_json(resp).await
    }

    async fn edit_comment(
        &mut self,
        comment: CommentId,
        edit: CommentEdit,
    ) -> Result<Comment, Error> {
        edit.validate()?;
        let resp = self
            .client
            .put(format!("{}/api/comments/{}", self.host, comment.0))
            .bearer_auth(self.token.0)
            .multipart(comment_form(edit.text, None, edit.files))
            .send()
            .await
            .map_err(transport_error)?;
        expect_json(resp).await
    }

    async fn delete_comment(&mut self, comment: CommentId) -> Result<(), Error> {
        let resp = self
            .client
            .delete(format!("{}/api/comments/{}", self.host, comment.0))
            .bearer_auth(self.token.0)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(resp).await?;
        Ok(())
    }

    async fn join_ticket_room(
        &mut self,
        ticket: TicketId,
    ) -> Result<mpsc::UnboundedReceiver<FeedMessage>, Error> {
        if self.ticket_rooms.contains_key(&ticket) {
            return Err(Error::Unknown(format!(
                "already subscribed to updates for ticket {}",
                ticket.0
            )));
        }
        let (receiver, cancel) = self.spawn_feed(
            RoomRequest::JoinTicketRoom(ticket),
            RoomRequest::LeaveTicketRoom(ticket),
            Some,
        )?;
        self.ticket_rooms.insert(ticket, cancel);
        Ok(receiver)
    }

    async fn leave_ticket_room(&mut self, ticket: TicketId) -> Result<(), Error> {
        match self.ticket_rooms.remove(&ticket) {
            Some(cancel) => {
                // the feed task sends the leave frame and shuts down
                let _ = cancel.send(true);
                Ok(())
            }
            None => Err(Error::Unknown(format!(
                "not subscribed to updates for ticket {}",
                ticket.0
            ))),
        }
    }
}

#[async_trait]
impl NotificationsApi for HttpApi {
    async fn fetch_notifications(&mut self) -> Result<Vec<Notification>, Error> {
        let resp = self
            .client
            .get(format!("{}/api/notifications", self.host))
            .bearer_auth(self.token.0)
            .send()
            .await
            .map_err(transport_error)?;
        expect_json(resp).await
    }

    async fn mark_read(&mut self, notification: NotificationId) -> Result<(), Error> {
        let resp = self
            .client
            .put(format!(
                "{}/api/notifications/{}/read",
                self.host, notification.0
            ))
            .bearer_auth(self.token.0)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(resp).await?;
        Ok(())
    }

    async fn mark_all_read(&mut self) -> Result<(), Error> {
        let resp = self
            .client
            .put(format!("{}/api/notifications/mark-all-read", self.host))
            .bearer_auth(self.token.0)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(resp).await?;
        Ok(())
    }

    async fn join_user_room(&mut self) -> Result<mpsc::UnboundedReceiver<Notification>, Error> {
        if self.user_room.is_some() {
            return Err(Error::Unknown(String::from(
                "already subscribed to user notifications",
            )));
        }
        let (receiver, cancel) = self.spawn_feed(
            RoomRequest::JoinUserRoom(self.user),
            RoomRequest::LeaveUserRoom(self.user),
            |msg| match msg {
                FeedMessage::NewNotification(n) => Some(n),
                _ => None,
            },
        )?;
        self.user_room = Some(cancel);
        Ok(receiver)
    }
}

/// Connection loop for one room subscription.
///
/// Authenticates with the bearer token, sends the join frame, then relays
/// decoded feed messages until the subscription is cancelled. Lost
/// connections are re-established (and the room re-joined) after a short
/// pause; liveness is tracked with the ping/pong exchange.
async fn run_feed<T, F>(
    ws_url: String,
    token: AuthToken,
    join: RoomRequest,
    leave: RoomRequest,
    filter: F,
    events: mpsc::UnboundedSender<T>,
    mut cancel: watch::Receiver<bool>,
) where
    T: Send + 'static,
    F: Fn(FeedMessage) -> Option<T> + Send + 'static,
{
    let join_frame = match serde_json::to_string(&join) {
        Ok(f) => f,
        Err(err) => {
            tracing::error!(?err, ?join, "failed serializing join frame");
            return;
        }
    };
    let leave_frame = match serde_json::to_string(&leave) {
        Ok(f) => f,
        Err(err) => {
            tracing::error!(?err, ?leave, "failed serializing leave frame");
            return;
        }
    };

    let mut first_attempt = true;
    'reconnect: loop {
        if *cancel.borrow() {
            return;
        }
        match first_attempt {
            true => first_attempt = false,
            false => {
                tracing::warn!(?join, "lost update feed connection");
                tokio::time::sleep(Duration::from_secs(ATTEMPT_SPACING_SECS)).await;
            }
        }

        let mut sock = match tokio_tungstenite::connect_async(ws_url.as_str()).await {
            Ok((s, _)) => s,
            Err(err) => {
                tracing::warn!(?err, "failed connecting to update feed");
                continue 'reconnect;
            }
        };

        // Authenticate, then join the room
        if sock.send(Message::Text(token.0.to_string())).await.is_err() {
            continue 'reconnect;
        }
        match sock.next().await {
            Some(Ok(Message::Text(ack))) if ack == "ok" => (),
            Some(Ok(Message::Text(ack))) => {
                tracing::error!(?ack, "update feed refused authentication");
                return;
            }
            _ => continue 'reconnect,
        }
        if sock.send(Message::Text(join_frame.clone())).await.is_err() {
            continue 'reconnect;
        }
        tracing::info!(?join, "joined update feed");

        let mut ping = tokio::time::interval(Duration::from_secs(PING_INTERVAL_SECS));
        ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last_pong = Instant::now();
        loop {
            tokio::select! {
                // cancelled, or every handle to this subscription dropped
                _ = cancel.changed() => {
                    let _ = sock.send(Message::Text(leave_frame.clone())).await;
                    let _ = sock.close(None).await;
                    tracing::info!(?leave, "left update feed");
                    return;
                }
                _ = ping.tick() => {
                    if last_pong.elapsed() > Duration::from_secs(DISCONNECT_INTERVAL_SECS) {
                        continue 'reconnect;
                    }
                    if sock.send(Message::Text(String::from("ping"))).await.is_err() {
                        continue 'reconnect;
                    }
                }
                msg = sock.next() => {
                    let msg: FeedMessage = match msg {
                        None | Some(Err(_)) | Some(Ok(Message::Close(_))) => continue 'reconnect,
                        Some(Ok(Message::Text(t))) => match serde_json::from_str(&t) {
                            Ok(m) => m,
                            Err(err) => {
                                tracing::warn!(?err, "undecodable update feed message");
                                continue;
                            }
                        },
                        Some(Ok(Message::Binary(b))) => match serde_json::from_slice(&b) {
                            Ok(m) => m,
                            Err(err) => {
                                tracing::warn!(?err, "undecodable update feed message");
                                continue;
                            }
                        },
                        // transport-level ping/pong frames
                        Some(Ok(_)) => continue,
                    };
                    match msg {
                        FeedMessage::Pong => last_pong = Instant::now(),
                        other => {
                            if let Some(event) = filter(other) {
                                if events.send(event).is_err() {
                                    // subscriber gone; no point reconnecting
                                    let _ = sock.send(Message::Text(leave_frame.clone())).await;
                                    let _ = sock.close(None).await;
                                    return;
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
