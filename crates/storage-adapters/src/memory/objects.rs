use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use domains::{ObjectStore, RemoteError, RemoteResult, UploadOptions};
use mime::Mime;

use super::Op;
use crate::object_path;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: Mime,
    pub cache_control: Option<String>,
}

/// Objects keyed by `(bucket, path)`.
pub struct MemoryObjectStore {
    base_url: String,
    objects: DashMap<(String, String), StoredObject>,
    failures: DashMap<(Op, String), String>,
}

impl MemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: DashMap::new(),
            failures: DashMap::new(),
        }
    }

    pub fn get(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.objects
            .get(&(bucket.to_string(), path.to_string()))
            .map(|o| o.value().clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Makes every `op` touching `path` (upload) or `bucket` (remove) fail.
    pub fn fail_on(&self, op: Op, key: &str, message: &str) {
        self.failures.insert((op, key.to_string()), message.to_string());
    }

    fn injected(&self, op: Op, key: &str) -> RemoteResult<()> {
        match self.failures.get(&(op, key.to_string())) {
            Some(message) => Err(RemoteError::api(500, message.value().clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: Mime,
        options: UploadOptions,
    ) -> RemoteResult<String> {
        self.injected(Op::Upload, path)?;
        let path = path.trim_start_matches('/').to_string();
        let key = (bucket.to_string(), path.clone());
        if !options.upsert && self.objects.contains_key(&key) {
            return Err(RemoteError::api(409, "The resource already exists"));
        }
        self.objects.insert(
            key,
            StoredObject {
                data,
                content_type,
                cache_control: options.cache_control,
            },
        );
        Ok(path)
    }

    async fn remove(&self, bucket: &str, paths: Vec<String>) -> RemoteResult<()> {
        self.injected(Op::Remove, bucket)?;
        for path in paths {
            self.objects.remove(&(bucket.to_string(), path));
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            object_path::encode(bucket),
            object_path::encode(path)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn upsert_controls_overwrites() {
        let store = MemoryObjectStore::new("http://memory.local/");
        let plain = UploadOptions::default();
        assert_ok!(
            store
                .upload("images", "a.png", Bytes::from_static(b"1"), mime::IMAGE_PNG, plain.clone())
                .await
        );

        let err = assert_err!(
            store
                .upload("images", "a.png", Bytes::from_static(b"2"), mime::IMAGE_PNG, plain)
                .await
        );
        assert_eq!(err, RemoteError::api(409, "The resource already exists"));

        let upsert = UploadOptions {
            upsert: true,
            cache_control: Some("3600".into()),
        };
        store
            .upload("images", "a.png", Bytes::from_static(b"2"), mime::IMAGE_PNG, upsert)
            .await
            .unwrap();
        let stored = store.get("images", "a.png").unwrap();
        assert_eq!(stored.data, Bytes::from_static(b"2"));
        assert_eq!(stored.cache_control.as_deref(), Some("3600"));
    }

    #[tokio::test]
    async fn remove_drops_listed_paths() {
        let store = MemoryObjectStore::new("http://memory.local/");
        for name in ["a.png", "b.png"] {
            store
                .upload("images", name, Bytes::new(), mime::IMAGE_PNG, UploadOptions::default())
                .await
                .unwrap();
        }
        store.remove("images", vec!["a.png".into()]).await.unwrap();
        assert!(store.get("images", "a.png").is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.public_url("images", "b.png"),
            "http://memory.local/storage/v1/object/public/images/b.png"
        );
    }
}
