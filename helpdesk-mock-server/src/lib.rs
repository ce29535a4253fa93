use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use helpdesk_api::{
    Comment, CommentEdit, CommentId, CommentNotice, CommentsApi, Error, FeedMessage, NewComment,
    Notification, NotificationId, NotificationsApi, ParentRef, TicketId, User,
};

/// In-memory stand-in for the external comments/notifications collaborator.
///
/// Comment lists are kept in insertion order, which is what the real list
/// endpoint returns and what the client treats as authoritative. Created
/// comments are relayed to every member of the ticket's update room, so tests
/// can exercise the push-then-re-fetch path.
pub struct MockServer {
    tickets: BTreeMap<TicketId, TicketRoom>,
    notifications: Vec<Notification>,
    user_feeds: Vec<mpsc::UnboundedSender<FeedMessage>>,
}

struct TicketRoom {
    comments: Vec<Comment>,
    feeds: Vec<mpsc::UnboundedSender<FeedMessage>>,
}

impl TicketRoom {
    fn relay(&mut self, msg: FeedMessage) {
        self.feeds.retain(|f| f.send(msg.clone()).is_ok());
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            tickets: BTreeMap::new(),
            notifications: Vec::new(),
            user_feeds: Vec::new(),
        }
    }

    pub fn add_ticket(&mut self, ticket: TicketId) {
        self.tickets.entry(ticket).or_insert(TicketRoom {
            comments: Vec::new(),
            feeds: Vec::new(),
        });
    }

    fn room(&self, ticket: TicketId) -> Result<&TicketRoom, Error> {
        self.tickets
            .get(&ticket)
            .ok_or(Error::UnknownTicket(ticket.0))
    }

    fn room_mut(&mut self, ticket: TicketId) -> Result<&mut TicketRoom, Error> {
        self.tickets
            .get_mut(&ticket)
            .ok_or(Error::UnknownTicket(ticket.0))
    }

    /// Number of live subscriptions to a ticket's update room.
    pub fn test_room_members(&self, ticket: TicketId) -> usize {
        self.tickets
            .get(&ticket)
            .map(|r| r.feeds.len())
            .unwrap_or(0)
    }

    /// Insert a pre-existing comment without relaying a push notice.
    pub fn seed_comment(
        &mut self,
        ticket: TicketId,
        author: User,
        text: impl Into<String>,
        parent: Option<CommentId>,
    ) -> Result<CommentId, Error> {
        let id = CommentId(Uuid::new_v4());
        let comment = Comment {
            id,
            text: text.into(),
            attachments: Vec::new(),
            user: author,
            parent_comment: parent.map(|id| ParentRef { id }),
            created_at: Utc::now(),
            likes: 0,
        };
        self.room_mut(ticket)?.comments.push(comment);
        Ok(id)
    }

    /// Push a notification to the user room (test hook for the external
    /// notification producers).
    pub fn push_notification(&mut self, message: impl Into<String>, link: Option<String>) {
        let n = Notification {
            id: NotificationId(Uuid::new_v4()),
            message: message.into(),
            link,
            is_read: false,
            created_at: Utc::now(),
        };
        self.notifications.insert(0, n.clone());
        self.user_feeds
            .retain(|f| f.send(FeedMessage::NewNotification(n.clone())).is_ok());
    }

    pub fn fetch_comments(&self, ticket: TicketId) -> Result<Vec<Comment>, Error> {
        Ok(self.room(ticket)?.comments.clone())
    }

    pub fn create_comment(
        &mut self,
        ticket: TicketId,
        comment: NewComment,
        author: User,
    ) -> Result<Comment, Error> {
        comment.validate()?;
        // a reply's parent must still exist on this ticket
        if let Some(parent) = comment.parent {
            if !self
                .room(ticket)?
                .comments
                .iter()
                .any(|c| c.id == parent)
            {
                return Err(Error::UnknownComment(parent.0));
            }
        }
        let created = Comment {
            id: CommentId(Uuid::new_v4()),
            text: comment.text,
            attachments: comment
                .files
                .iter()
                .map(|f| format!("uploads/{}", f.file_name))
                .collect(),
            user: author,
            parent_comment: comment.parent.map(|id| ParentRef { id }),
            created_at: Utc::now(),
            likes: 0,
        };
        let room = self.room_mut(ticket)?;
        room.comments.push(created.clone());
        room.relay(FeedMessage::NewComment(CommentNotice {
            ticket,
            comment: Some(created.id),
        }));
        Ok(created)
    }

    pub fn edit_comment(&mut self, comment: CommentId, edit: CommentEdit) -> Result<Comment, Error> {
        edit.validate()?;
        for room in self.tickets.values_mut() {
            if let Some(c) = room.comments.iter_mut().find(|c| c.id == comment) {
                c.text = edit.text;
                c.attachments
                    .extend(edit.files.iter().map(|f| format!("uploads/{}", f.file_name)));
                return Ok(c.clone());
            }
        }
        Err(Error::UnknownComment(comment.0))
    }

    /// Remove a comment and everything nested under it. (The client never
    /// relies on this shape; it re-fetches after every mutation.)
    pub fn delete_comment(&mut self, comment: CommentId) -> Result<(), Error> {
        for room in self.tickets.values_mut() {
            if !room.comments.iter().any(|c| c.id == comment) {
                continue;
            }
            let mut doomed = vec![comment];
            let mut i = 0;
            while i < doomed.len() {
                let parent = doomed[i];
                doomed.extend(
                    room.comments
                        .iter()
                        .filter(|c| c.parent_comment.map(|p| p.id) == Some(parent))
                        .map(|c| c.id),
                );
                i += 1;
            }
            room.comments.retain(|c| !doomed.contains(&c.id));
            return Ok(());
        }
        Err(Error::UnknownComment(comment.0))
    }

    pub fn join_ticket_room(
        &mut self,
        ticket: TicketId,
    ) -> Result<mpsc::UnboundedReceiver<FeedMessage>, Error> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.room_mut(ticket)?.feeds.push(sender);
        Ok(receiver)
    }

    /// Subscriptions are a stack: leaving drops the most recent one, which is
    /// exact for the one-session-per-ticket usage the tests exercise.
    pub fn leave_ticket_room(&mut self, ticket: TicketId) -> Result<(), Error> {
        let room = self.room_mut(ticket)?;
        match room.feeds.pop() {
            Some(_) => Ok(()),
            None => Err(Error::Unknown(format!(
                "no subscription to leave for ticket {}",
                ticket.0
            ))),
        }
    }

    pub fn fetch_notifications(&self) -> Vec<Notification> {
        self.notifications.clone()
    }

    pub fn mark_read(&mut self, notification: NotificationId) -> Result<(), Error> {
        match self
            .notifications
            .iter_mut()
            .find(|n| n.id == notification)
        {
            Some(n) => {
                n.is_read = true;
                Ok(())
            }
            None => Err(Error::Unknown(format!(
                "unknown notification {}",
                notification.0
            ))),
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.notifications {
            n.is_read = true;
        }
    }

    pub fn join_user_room(&mut self) -> mpsc::UnboundedReceiver<Notification> {
        let (sender, receiver) = mpsc::unbounded_channel();
        // adapt the shared feed envelope to the notification-only channel
        let (feed_tx, mut feed_rx) = mpsc::unbounded_channel();
        self.user_feeds.push(feed_tx);
        tokio::spawn(async move {
            while let Some(msg) = feed_rx.recv().await {
                if let FeedMessage::NewNotification(n) = msg {
                    if sender.send(n).is_err() {
                        return;
                    }
                }
            }
        });
        receiver
    }
}

impl Default for MockServer {
    fn default() -> Self {
        MockServer::new()
    }
}

/// Cloneable collaborator handle for one authenticated user; every clone
/// talks to the same in-memory server.
#[derive(Clone)]
pub struct MockApi {
    server: Arc<Mutex<MockServer>>,
    author: User,
}

impl MockApi {
    pub fn new(server: Arc<Mutex<MockServer>>, author: User) -> MockApi {
        MockApi { server, author }
    }

    pub fn server(&self) -> Arc<Mutex<MockServer>> {
        self.server.clone()
    }
}

#[async_trait]
impl CommentsApi for MockApi {
    async fn fetch_comments(&mut self, ticket: TicketId) -> Result<Vec<Comment>, Error> {
        self.server.lock().await.fetch_comments(ticket)
    }

    async fn create_comment(
        &mut self,
        ticket: TicketId,
        comment: NewComment,
    ) -> Result<Comment, Error> {
        self.server
            .lock()
            .await
            .create_comment(ticket, comment, self.author.clone())
    }

    async fn edit_comment(
        &mut self,
        comment: CommentId,
        edit: CommentEdit,
    ) -> Result<Comment, Error> {
        self.server.lock().await.edit_comment(comment, edit)
    }

    async fn delete_comment(&mut self, comment: CommentId) -> Result<(), Error> {
        self.server.lock().await.delete_comment(comment)
    }

    async fn join_ticket_room(
        &mut self,
        ticket: TicketId,
    ) -> Result<mpsc::UnboundedReceiver<FeedMessage>, Error> {
        self.server.lock().await.join_ticket_room(ticket)
    }

    async fn leave_ticket_room(&mut self, ticket: TicketId) -> Result<(), Error> {
        self.server.lock().await.leave_ticket_room(ticket)
    }
}

#[async_trait]
impl NotificationsApi for MockApi {
    async fn fetch_notifications(&mut self) -> Result<Vec<Notification>, Error> {
        Ok(self.server.lock().await.fetch_notifications())
    }

    async fn mark_read(&mut self, notification: NotificationId) -> Result<(), Error> {
        self.server.lock().await.mark_read(notification)
    }

    async fn mark_all_read(&mut self) -> Result<(), Error> {
        self.server.lock().await.mark_all_read();
        Ok(())
    }

    async fn join_user_room(&mut self) -> Result<mpsc::UnboundedReceiver<Notification>, Error> {
        Ok(self.server.lock().await.join_user_room())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_api::FileUpload;

    fn server_with_ticket() -> (MockServer, TicketId) {
        let mut server = MockServer::new();
        let ticket = TicketId(Uuid::new_v4());
        server.add_ticket(ticket);
        (server, ticket)
    }

    #[test]
    fn create_relays_a_notice_to_room_members() {
        let (mut server, ticket) = server_with_ticket();
        let mut feed = server.join_ticket_room(ticket).expect("joining room");
        let created = server
            .create_comment(ticket, NewComment::root("hello", vec![]), User::stub("a"))
            .expect("creating comment");
        match feed.try_recv().expect("notice queued") {
            FeedMessage::NewComment(notice) => {
                assert_eq!(notice.ticket, ticket);
                assert_eq!(notice.comment, Some(created.id));
            }
            other => panic!("unexpected feed message {other:?}"),
        }
    }

    #[test]
    fn replies_to_missing_parents_are_rejected() {
        let (mut server, ticket) = server_with_ticket();
        let ghost = CommentId(Uuid::new_v4());
        let err = server
            .create_comment(
                ticket,
                NewComment::reply(ghost, "hi", vec![]),
                User::stub("a"),
            )
            .expect_err("parent is unknown");
        assert_eq!(err, Error::UnknownComment(ghost.0));
    }

    #[test]
    fn empty_comment_requires_an_attachment() {
        let (mut server, ticket) = server_with_ticket();
        let err = server
            .create_comment(ticket, NewComment::root("  ", vec![]), User::stub("a"))
            .expect_err("no text, no attachment");
        assert_eq!(err, Error::EmptyComment);

        let ok = server
            .create_comment(
                ticket,
                NewComment::root(
                    "",
                    vec![FileUpload {
                        file_name: String::from("shot.png"),
                        bytes: vec![1, 2, 3],
                    }],
                ),
                User::stub("a"),
            )
            .expect("attachment-only comment is fine");
        assert_eq!(ok.attachments, vec![String::from("uploads/shot.png")]);
    }

    #[test]
    fn delete_cascades_to_descendants() {
        let (mut server, ticket) = server_with_ticket();
        let root = server
            .seed_comment(ticket, User::stub("a"), "root", None)
            .expect("seeding root");
        let child = server
            .seed_comment(ticket, User::stub("b"), "child", Some(root))
            .expect("seeding child");
        let _grandchild = server
            .seed_comment(ticket, User::stub("c"), "grandchild", Some(child))
            .expect("seeding grandchild");
        let other = server
            .seed_comment(ticket, User::stub("d"), "other", None)
            .expect("seeding sibling");

        server.delete_comment(root).expect("deleting root");
        let left = server.fetch_comments(ticket).expect("fetching");
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, other);
    }
}
