use std::collections::HashMap;

use crate::api::{Comment, CommentId};

/// One comment together with its replies, in display order.
///
/// This is a pure projection of the flat list: it is rebuilt from scratch on
/// every change rather than patched in place, so it can never diverge from
/// the authoritative list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn id(&self) -> CommentId {
        self.comment.id
    }

    /// Total number of comments in `forest`, all nesting levels included.
    pub fn total_count(forest: &[CommentNode]) -> usize {
        let mut count = 0;
        let mut stack: Vec<&CommentNode> = forest.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }

    pub fn find(forest: &[CommentNode], id: CommentId) -> Option<&CommentNode> {
        let mut stack: Vec<&CommentNode> = forest.iter().collect();
        while let Some(node) = stack.pop() {
            if node.comment.id == id {
                return Some(node);
            }
            stack.extend(node.replies.iter());
        }
        None
    }

    /// Depth of the deepest node; roots are at depth 0, an empty forest has
    /// no depth.
    pub fn max_depth(forest: &[CommentNode]) -> Option<usize> {
        let mut deepest = None;
        let mut stack: Vec<(&CommentNode, usize)> = forest.iter().map(|n| (n, 0)).collect();
        while let Some((node, depth)) = stack.pop() {
            if deepest.map_or(true, |d| depth > d) {
                deepest = Some(depth);
            }
            stack.extend(node.replies.iter().map(|n| (n, depth + 1)));
        }
        deepest
    }
}

/// Build the display forest from the server's flat comment list.
///
/// Each comment appears exactly once, as a root if its parent reference is
/// absent and nested under its parent otherwise. A comment whose parent id is
/// not in the list is dropped entirely (tolerance for concurrently deleted
/// parents, not an error), and so is anything nested under it. Root order and
/// per-parent reply order follow the input order.
///
/// Two linear passes plus an iterative assembly, so arbitrarily deep reply
/// chains cannot overflow the stack.
pub fn build_forest(flat: &[Comment]) -> Vec<CommentNode> {
    let mut index_of = HashMap::with_capacity(flat.len());
    for (i, c) in flat.iter().enumerate() {
        index_of.insert(c.id, i);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); flat.len()];
    let mut roots: Vec<usize> = Vec::new();
    for (i, c) in flat.iter().enumerate() {
        match c.parent_id() {
            None => roots.push(i),
            Some(parent) => match index_of.get(&parent) {
                Some(&p) => children[p].push(i),
                None => {
                    tracing::debug!(comment = ?c.id, ?parent, "dropping orphan comment");
                }
            },
        }
    }

    // Post-order over the reachable nodes, so every node is assembled after
    // all of its children.
    let mut order = Vec::with_capacity(flat.len());
    let mut stack: Vec<(usize, bool)> = roots.iter().rev().map(|&i| (i, false)).collect();
    while let Some((i, children_done)) = stack.pop() {
        if children_done {
            order.push(i);
            continue;
        }
        stack.push((i, true));
        stack.extend(children[i].iter().rev().map(|&c| (c, false)));
    }

    let mut built: Vec<Option<CommentNode>> = flat.iter().map(|_| None).collect();
    for &i in &order {
        let replies = children[i]
            .iter()
            .map(|&c| built[c].take().expect("child assembled before its parent"))
            .collect();
        built[i] = Some(CommentNode {
            comment: flat[i].clone(),
            replies,
        });
    }

    roots
        .iter()
        .map(|&i| built[i].take().expect("root assembled by post-order pass"))
        .collect()
}
