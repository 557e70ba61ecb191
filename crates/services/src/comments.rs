//! Comment moderation: load the post → comment → reply tree, add comments
//! and replies, delete with reply cascade.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    Comment, CommentTree, Entry, Filter, IdentityProvider, PostSummary, Query, RecordStore,
    Records, Reply, UserProfile,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Result, ServiceError};

const EMPTY_TEXT: &str = "Write something before submitting";
const NOT_SIGNED_IN: &str = "You must be logged in to comment.";
const NO_USER_DATA: &str = "Could not fetch user data.";
const ANONYMOUS: &str = "Anonym";

/// Author snapshot copied onto each comment and reply.
#[derive(Debug, Clone, PartialEq)]
struct Author {
    id: Uuid,
    name: String,
    email: String,
}

#[derive(Deserialize)]
struct AuthorRow {
    full_name: Option<String>,
    email: Option<String>,
}

pub struct CommentService {
    store: Arc<dyn RecordStore>,
    identity: Arc<dyn IdentityProvider>,
    tree: CommentTree,
}

impl CommentService {
    pub fn new(store: Arc<dyn RecordStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            store,
            identity,
            tree: CommentTree::default(),
        }
    }

    pub fn tree(&self) -> &CommentTree {
        &self.tree
    }

    /// Fetches posts, comments and replies and rebuilds the tree.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<()> {
        let store = self.store.as_ref();
        let posts = Records::<PostSummary>::new(store)
            .fetch(&Query::all().columns(PostSummary::COLUMNS))
            .await
            .map_err(ServiceError::read)?;
        let comments = Records::<Comment>::new(store)
            .fetch(&Query::all().oldest_first())
            .await
            .map_err(ServiceError::read)?;
        let replies = Records::<Reply>::new(store)
            .fetch(&Query::all().oldest_first())
            .await
            .map_err(ServiceError::read)?;

        info!(
            posts = posts.len(),
            comments = comments.len(),
            replies = replies.len(),
            "comment tree loaded"
        );
        self.tree = CommentTree::new(posts, comments, replies);
        Ok(())
    }

    #[instrument(skip(self, text))]
    pub async fn add_comment(&mut self, post_id: Uuid, text: &str) -> Result<Comment> {
        let text = non_empty(text)?;
        let author = self.author().await?;
        let local = Comment {
            id: Uuid::new_v4(),
            post_id,
            content: text.to_string(),
            user_id: author.id,
            user_name: author.name,
            user_email: author.email,
            created_at: Utc::now(),
        };

        let echoed = Records::<Comment>::new(self.store.as_ref())
            .insert(&local)
            .await
            .map_err(ServiceError::write)?;
        let stored = echoed.into_iter().next().unwrap_or(local);
        self.tree.add_comment(stored.clone());
        Ok(stored)
    }

    #[instrument(skip(self, text))]
    pub async fn add_reply(&mut self, comment_id: Uuid, text: &str) -> Result<Reply> {
        let text = non_empty(text)?;
        let author = self.author().await?;
        let local = Reply {
            id: Uuid::new_v4(),
            comment_id,
            content: text.to_string(),
            user_id: author.id,
            user_name: author.name,
            user_email: author.email,
            created_at: Utc::now(),
        };

        let echoed = Records::<Reply>::new(self.store.as_ref())
            .insert(&local)
            .await
            .map_err(ServiceError::write)?;
        let stored = echoed.into_iter().next().unwrap_or(local);
        self.tree.add_reply(stored.clone());
        Ok(stored)
    }

    /// Deletes the comment's replies, then the comment. If the reply delete
    /// fails the comment is left alone, remotely and locally. Each confirmed
    /// step is mirrored locally as soon as it succeeds.
    #[instrument(skip(self))]
    pub async fn delete_comment(&mut self, comment_id: Uuid) -> Result<usize> {
        let store = self.store.as_ref();
        Records::<Reply>::new(store)
            .delete_where(&Filter::eq("comment_id", comment_id))
            .await
            .map_err(ServiceError::write)?;
        let dropped = self.tree.remove_replies_of(comment_id);

        Records::<Comment>::new(store)
            .delete_by_id(&comment_id)
            .await
            .map_err(ServiceError::write)?;
        self.tree.remove_comment(comment_id);

        info!(replies = dropped, "comment deleted");
        Ok(dropped)
    }

    #[instrument(skip(self))]
    pub async fn delete_reply(&mut self, reply_id: Uuid) -> Result<()> {
        Records::<Reply>::new(self.store.as_ref())
            .delete_by_id(&reply_id)
            .await
            .map_err(ServiceError::write)?;
        self.tree.remove_reply(reply_id);
        Ok(())
    }

    /// Deletes whatever `id` refers to; ids not known as replies are treated
    /// as comments.
    pub async fn delete(&mut self, id: Uuid) -> Result<Entry> {
        match self.tree.locate(id) {
            Some(Entry::Reply) => self.delete_reply(id).await.map(|_| Entry::Reply),
            Some(Entry::Comment) | None => self.delete_comment(id).await.map(|_| Entry::Comment),
        }
    }

    async fn author(&self) -> Result<Author> {
        let user = match self.identity.current_user().await {
            Ok(Some(user)) => user,
            Ok(None) | Err(_) => return Err(ServiceError::Auth(NOT_SIGNED_IN.into())),
        };

        let rows = self
            .store
            .select(
                <UserProfile as domains::Record>::TABLE,
                &Query::all().columns("full_name,email").eq("id", user.id),
            )
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "author lookup failed");
                ServiceError::Write(NO_USER_DATA.into())
            })?;
        let [row] = <[_; 1]>::try_from(rows)
            .map_err(|_| ServiceError::Write(NO_USER_DATA.into()))?;
        let row: AuthorRow =
            serde_json::from_value(row).map_err(|_| ServiceError::Write(NO_USER_DATA.into()))?;

        Ok(Author {
            id: user.id,
            name: row
                .full_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| ANONYMOUS.to_string()),
            email: row
                .email
                .filter(|e| !e.is_empty())
                .or(user.email)
                .unwrap_or_default(),
        })
    }
}

fn non_empty(text: &str) -> Result<&str> {
    if text.trim().is_empty() {
        Err(ServiceError::Validation(EMPTY_TEXT.into()))
    } else {
        Ok(text)
    }
}
