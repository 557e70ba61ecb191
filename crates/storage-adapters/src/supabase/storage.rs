//! `ObjectStore` over the storage API at `/storage/v1/object`.

use async_trait::async_trait;
use bytes::Bytes;
use domains::{ObjectStore, RemoteResult, UploadOptions};
use mime::Mime;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use serde_json::json;
use tracing::{debug, instrument};

use super::{check, transport, Connection};
use crate::object_path;

pub struct BucketStore {
    conn: Connection,
}

impl BucketStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

/// Upload target; `path` is percent-encoded segment by segment.
pub fn object_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!(
        "{base_url}/storage/v1/object/{}/{}",
        object_path::encode(bucket),
        object_path::encode(path)
    )
}

pub fn public_object_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!(
        "{base_url}/storage/v1/object/public/{}/{}",
        object_path::encode(bucket),
        object_path::encode(path)
    )
}

/// `content-type`, `x-upsert` and, when set, `cache-control: max-age=N`.
pub fn upload_headers(content_type: &Mime, options: &UploadOptions) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    headers.insert(
        "x-upsert",
        HeaderValue::from_static(if options.upsert { "true" } else { "false" }),
    );
    if let Some(seconds) = &options.cache_control {
        if let Ok(value) = HeaderValue::from_str(&format!("max-age={seconds}")) {
            headers.insert(CACHE_CONTROL, value);
        }
    }
    headers
}

#[async_trait]
impl ObjectStore for BucketStore {
    #[instrument(skip(self, data, options), fields(bytes = data.len()))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: Mime,
        options: UploadOptions,
    ) -> RemoteResult<String> {
        let url = object_url(self.conn.base_url(), bucket, path);
        debug!(%url, upsert = options.upsert, "uploading object");

        let request = self
            .conn
            .http()
            .post(&url)
            .headers(self.conn.headers()?)
            .headers(upload_headers(&content_type, &options))
            .body(data);
        check(request.send().await.map_err(transport)?).await?;
        Ok(path.trim_start_matches('/').to_string())
    }

    #[instrument(skip(self))]
    async fn remove(&self, bucket: &str, paths: Vec<String>) -> RemoteResult<()> {
        let url = self
            .conn
            .endpoint(&format!("/storage/v1/object/{}", object_path::encode(bucket)));
        let request = self
            .conn
            .http()
            .delete(&url)
            .headers(self.conn.headers()?)
            .json(&json!({ "prefixes": paths }));
        check(request.send().await.map_err(transport)?).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        public_object_url(self.conn.base_url(), bucket, path)
    }
}
