//! # Ports
//!
//! The three faces of the remote platform. Every adapter implements these;
//! services only ever see the traits.

use async_trait::async_trait;
use bytes::Bytes;
use mime::Mime;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::RemoteResult;
use crate::models::{AuthEvent, AuthUser, Session};
use crate::query::{Filter, Query};

/// Record-oriented CRUD against named collections.
///
/// Rows travel as loose JSON; `Records<T>` is the only place they become
/// typed records.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> RemoteResult<Vec<Value>>;

    /// Inserts rows and returns whatever the store echoes back (possibly nothing).
    async fn insert(&self, table: &str, rows: Vec<Value>) -> RemoteResult<Vec<Value>>;

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> RemoteResult<Vec<Value>>;

    async fn delete(&self, table: &str, filter: &Filter) -> RemoteResult<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// Overwrite an existing object at the same path.
    pub upsert: bool,
    pub cache_control: Option<String>,
}

/// Binary object storage against named buckets.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `data` and returns the object path inside the bucket.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: Mime,
        options: UploadOptions,
    ) -> RemoteResult<String>;

    async fn remove(&self, bucket: &str, paths: Vec<String>) -> RemoteResult<()>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Session and identity service.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> RemoteResult<Session>;

    /// The active session, if any. Expired sessions count as absent.
    async fn current_session(&self) -> RemoteResult<Option<Session>>;

    async fn current_user(&self) -> RemoteResult<Option<AuthUser>>;

    async fn sign_out(&self) -> RemoteResult<()>;

    /// Receives every session change from now on.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
