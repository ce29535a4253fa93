use crate::{
    api::{Comment, CommentId, TicketId},
    build_forest, CommentNode,
};

/// Inline form selection for a comment thread.
///
/// One shared slot for the whole thread, not per-node state: at most one
/// comment can be in `Replying` or `Editing` at a time, and starting a new
/// selection displaces the previous one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Composer {
    Idle,
    Replying(CommentId),
    Editing(CommentId),
}

/// The comment thread of one ticket: the authoritative flat list, the forest
/// derived from it, and the composer selection.
///
/// The flat list is only ever replaced wholesale (by a re-fetch from the
/// collaborator); the forest is rebuilt on every replacement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TicketThread {
    ticket: TicketId,
    comments: Vec<Comment>,
    forest: Vec<CommentNode>,
    composer: Composer,
}

impl TicketThread {
    pub fn new(ticket: TicketId) -> TicketThread {
        TicketThread {
            ticket,
            comments: Vec::new(),
            forest: Vec::new(),
            composer: Composer::Idle,
        }
    }

    pub fn ticket(&self) -> TicketId {
        self.ticket
    }

    /// The flat list, in the server's order.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// The displayed forest.
    pub fn forest(&self) -> &[CommentNode] {
        &self.forest
    }

    /// Number of comments actually displayed (orphans excluded).
    pub fn displayed_count(&self) -> usize {
        CommentNode::total_count(&self.forest)
    }

    /// True if `id` is displayed somewhere in the forest.
    pub fn contains(&self, id: CommentId) -> bool {
        CommentNode::find(&self.forest, id).is_some()
    }

    /// Replace the flat list with a fresh server fetch and rebuild the
    /// forest. A composer selection whose target is no longer displayed is
    /// reset, so a form can never stay open on a vanished comment.
    pub fn set_comments(&mut self, comments: Vec<Comment>) {
        self.comments = comments;
        self.forest = build_forest(&self.comments);
        match self.composer {
            Composer::Replying(id) | Composer::Editing(id) if !self.contains(id) => {
                tracing::debug!(comment = ?id, "composer target disappeared, resetting");
                self.composer = Composer::Idle;
            }
            _ => (),
        }
    }

    pub fn composer(&self) -> Composer {
        self.composer
    }

    /// Open the inline reply form under `id`. Ignored if the comment is not
    /// displayed.
    pub fn start_reply(&mut self, id: CommentId) {
        if self.contains(id) {
            self.composer = Composer::Replying(id);
        }
    }

    /// Open the inline edit form on `id`. Ignored if the comment is not
    /// displayed.
    pub fn start_edit(&mut self, id: CommentId) {
        if self.contains(id) {
            self.composer = Composer::Editing(id);
        }
    }

    pub fn cancel_composer(&mut self) {
        self.composer = Composer::Idle;
    }

    pub fn is_replying_to(&self, id: CommentId) -> bool {
        self.composer == Composer::Replying(id)
    }

    pub fn is_editing(&self, id: CommentId) -> bool {
        self.composer == Composer::Editing(id)
    }
}
