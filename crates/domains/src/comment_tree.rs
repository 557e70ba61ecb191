//! # Comment tree
//!
//! Joins independently fetched posts, comments and replies into
//! post → comments → replies, and mirrors confirmed writes locally.
//!
//! Children are always ordered by ascending creation time; equal
//! timestamps keep fetch/insertion order.

use uuid::Uuid;

use crate::list::EntityList;
use crate::models::{Comment, PostSummary, Reply, Timestamped};

#[derive(Debug, Clone, PartialEq)]
pub struct CommentThread<'a> {
    pub comment: &'a Comment,
    pub replies: Vec<&'a Reply>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostThread<'a> {
    pub post: &'a PostSummary,
    pub comments: Vec<CommentThread<'a>>,
}

/// What an id found in the tree refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Comment,
    Reply,
}

#[derive(Debug, Clone, Default)]
pub struct CommentTree {
    posts: EntityList<PostSummary>,
    comments: EntityList<Comment>,
    replies: EntityList<Reply>,
}

impl CommentTree {
    pub fn new(posts: Vec<PostSummary>, comments: Vec<Comment>, replies: Vec<Reply>) -> Self {
        Self {
            posts: posts.into(),
            comments: comments.into(),
            replies: replies.into(),
        }
    }

    pub fn posts(&self) -> &EntityList<PostSummary> {
        &self.posts
    }

    pub fn comments(&self) -> &EntityList<Comment> {
        &self.comments
    }

    pub fn replies(&self) -> &EntityList<Reply> {
        &self.replies
    }

    pub fn comments_for(&self, post_id: Uuid) -> Vec<&Comment> {
        oldest_first(self.comments.iter().filter(|c| c.post_id == post_id))
    }

    pub fn replies_for(&self, comment_id: Uuid) -> Vec<&Reply> {
        oldest_first(self.replies.iter().filter(|r| r.comment_id == comment_id))
    }

    /// Every post with its comments and their replies, posts in fetch order.
    pub fn assemble(&self) -> Vec<PostThread<'_>> {
        self.posts
            .iter()
            .map(|post| PostThread {
                post,
                comments: self
                    .comments_for(post.id)
                    .into_iter()
                    .map(|comment| CommentThread {
                        comment,
                        replies: self.replies_for(comment.id),
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn locate(&self, id: Uuid) -> Option<Entry> {
        if self.replies.contains(&id) {
            Some(Entry::Reply)
        } else if self.comments.contains(&id) {
            Some(Entry::Comment)
        } else {
            None
        }
    }

    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.insert(comment);
    }

    pub fn add_reply(&mut self, reply: Reply) {
        self.replies.insert(reply);
    }

    /// Drops the comment's replies, then the comment. Returns the number of
    /// replies dropped, or `None` if the comment was not present.
    pub fn remove_comment(&mut self, comment_id: Uuid) -> Option<usize> {
        let dropped = self.remove_replies_of(comment_id);
        self.comments.remove(&comment_id).map(|_| dropped)
    }

    /// Drops every reply under `comment_id`; returns how many went.
    pub fn remove_replies_of(&mut self, comment_id: Uuid) -> usize {
        self.replies.retain(|r| r.comment_id != comment_id)
    }

    pub fn remove_reply(&mut self, reply_id: Uuid) -> Option<Reply> {
        self.replies.remove(&reply_id)
    }
}

fn oldest_first<'a, T: Timestamped + 'a>(items: impl Iterator<Item = &'a T>) -> Vec<&'a T> {
    let mut items: Vec<&T> = items.collect();
    items.sort_by_key(|item| item.created_at());
    items
}
