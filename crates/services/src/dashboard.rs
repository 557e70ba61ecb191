//! Read-only landing view: the latest post, the latest comments with their
//! replies, and the latest ads.

use std::sync::Arc;

use domains::{Ad, Comment, Post, Query, RecordStore, Records, Reply};
use tracing::instrument;

use crate::error::{Result, ServiceError};

const LATEST_COMMENTS: usize = 10;
const LATEST_ADS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct CommentWithReplies {
    pub comment: Comment,
    /// Oldest first, like every other reply listing.
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dashboard {
    pub latest_post: Option<Post>,
    pub latest_comments: Vec<CommentWithReplies>,
    pub latest_ads: Vec<Ad>,
}

pub struct DashboardService {
    store: Arc<dyn RecordStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Runs the queries one after another; any failure fails the whole view.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Dashboard> {
        let store = self.store.as_ref();

        let latest_post = Records::<Post>::new(store)
            .fetch(&Query::all().newest_first().limit(1))
            .await
            .map_err(ServiceError::read)?
            .into_iter()
            .next();

        let comments = Records::<Comment>::new(store)
            .fetch(&Query::all().newest_first().limit(LATEST_COMMENTS))
            .await
            .map_err(ServiceError::read)?;

        let replies = Records::<Reply>::new(store);
        let mut latest_comments = Vec::with_capacity(comments.len());
        for comment in comments {
            let for_comment = replies
                .fetch(&Query::all().eq("comment_id", comment.id).oldest_first())
                .await
                .map_err(ServiceError::read)?;
            latest_comments.push(CommentWithReplies {
                comment,
                replies: for_comment,
            });
        }

        let latest_ads = Records::<Ad>::new(store)
            .fetch(&Query::all().newest_first().limit(LATEST_ADS))
            .await
            .map_err(ServiceError::read)?;

        Ok(Dashboard {
            latest_post,
            latest_comments,
            latest_ads,
        })
    }
}
