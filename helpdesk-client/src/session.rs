use tokio::sync::mpsc;

use crate::{
    api::{CommentEdit, CommentId, CommentsApi, Error, FeedMessage, FileUpload, NewComment, TicketId},
    TicketThread,
};

/// One ticket-detail view's connection to the comments collaborator.
///
/// Opening a session joins the per-ticket update channel and performs the
/// initial fetch; closing it leaves the channel. Exactly one join and one
/// leave per session, so subscriptions cannot leak across ticket navigations.
///
/// Every mutation goes through the collaborator first and, on success,
/// re-fetches the full flat list; the server's list is the single source of
/// truth and nothing is applied optimistically. On failure the prior state is
/// left untouched and the error is returned for display.
pub struct ThreadSession<A> {
    api: A,
    thread: TicketThread,
    feed: mpsc::UnboundedReceiver<FeedMessage>,
    closed: bool,
}

impl<A: CommentsApi> ThreadSession<A> {
    pub async fn open(mut api: A, ticket: TicketId) -> Result<ThreadSession<A>, Error> {
        let feed = api.join_ticket_room(ticket).await?;
        let mut thread = TicketThread::new(ticket);
        thread.set_comments(api.fetch_comments(ticket).await?);
        Ok(ThreadSession {
            api,
            thread,
            feed,
            closed: false,
        })
    }

    pub fn thread(&self) -> &TicketThread {
        &self.thread
    }

    /// Composer and other view-local state live on the thread.
    pub fn thread_mut(&mut self) -> &mut TicketThread {
        &mut self.thread
    }

    /// Re-fetch the authoritative flat list and rebuild the forest.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        let comments = self.api.fetch_comments(self.thread.ticket()).await?;
        self.thread.set_comments(comments);
        Ok(())
    }

    /// Post a top-level comment, then re-fetch.
    pub async fn post_comment(
        &mut self,
        text: impl Into<String>,
        files: Vec<FileUpload>,
    ) -> Result<(), Error> {
        self.submit(NewComment::root(text, files)).await
    }

    /// Post a reply under `parent`, then re-fetch. Closes the reply form on
    /// success.
    pub async fn post_reply(
        &mut self,
        parent: CommentId,
        text: impl Into<String>,
        files: Vec<FileUpload>,
    ) -> Result<(), Error> {
        self.submit(NewComment::reply(parent, text, files)).await?;
        self.thread.cancel_composer();
        Ok(())
    }

    async fn submit(&mut self, comment: NewComment) -> Result<(), Error> {
        comment.validate()?;
        self.api
            .create_comment(self.thread.ticket(), comment)
            .await?;
        self.refresh().await
    }

    /// Replace a comment's text (and append attachments), then re-fetch.
    /// Closes the edit form on success.
    pub async fn submit_edit(
        &mut self,
        comment: CommentId,
        text: impl Into<String>,
        files: Vec<FileUpload>,
    ) -> Result<(), Error> {
        let edit = CommentEdit::new(text, files);
        edit.validate()?;
        self.api.edit_comment(comment, edit).await?;
        self.thread.cancel_composer();
        self.refresh().await
    }

    /// Delete a comment, then re-fetch. Same re-fetch policy as every other
    /// mutation; the removal is not applied locally first.
    pub async fn delete_comment(&mut self, comment: CommentId) -> Result<(), Error> {
        self.api.delete_comment(comment).await?;
        self.refresh().await
    }

    /// Wait for the next push message. Returns None once the feed is gone
    /// (collaborator dropped the channel).
    pub async fn next_feed_message(&mut self) -> Option<FeedMessage> {
        self.feed.recv().await
    }

    /// Apply one push message. A new-comment notice for the viewed ticket
    /// triggers a full re-fetch; the pushed payload itself is never applied,
    /// so duplicate deliveries only cost a redundant fetch. Returns whether a
    /// re-fetch happened.
    pub async fn handle_feed(&mut self, msg: FeedMessage) -> Result<bool, Error> {
        match msg {
            FeedMessage::Pong => Ok(false),
            FeedMessage::NewComment(notice) if notice.ticket == self.thread.ticket() => {
                tracing::debug!(ticket = ?notice.ticket, "new comment pushed, re-fetching");
                self.refresh().await?;
                Ok(true)
            }
            FeedMessage::NewComment(_) => Ok(false),
            // ticket field updates and user notifications are outside the
            // comment thread
            FeedMessage::TicketUpdated(_) | FeedMessage::NewNotification(_) => Ok(false),
        }
    }

    /// Drain everything already queued on the feed and apply it. Bursts cause
    /// one redundant re-fetch per notice; accepted instead of coalescing.
    pub async fn pump_feed(&mut self) -> Result<bool, Error> {
        let mut refreshed = false;
        while let Ok(msg) = self.feed.try_recv() {
            refreshed |= self.handle_feed(msg).await?;
        }
        Ok(refreshed)
    }

    /// Leave the per-ticket channel. Must be called when navigating away from
    /// the ticket.
    pub async fn close(mut self) -> Result<(), Error> {
        self.closed = true;
        self.api.leave_ticket_room(self.thread.ticket()).await
    }
}

impl<A> Drop for ThreadSession<A> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                ticket = ?self.thread.ticket(),
                "thread session dropped without close(), room subscription may leak"
            );
        }
    }
}
