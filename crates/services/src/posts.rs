//! Post management: list, create/update from the editor form, delete, and
//! the image uploads attached to a post.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use domains::{
    buckets, ObjectStore, Post, PostDraft, PostForm, Query, RecordStore, Records, UploadOptions,
};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{Result, ServiceError};

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub name: String,
    pub data: Bytes,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn content_type(&self) -> mime::Mime {
        mime_guess::from_path(&self.name).first_or_octet_stream()
    }
}

/// Insert row: the draft plus the client-assigned id and timestamp.
#[derive(Serialize)]
struct NewPost<'a> {
    id: Uuid,
    created_at: chrono::DateTime<Utc>,
    #[serde(flatten)]
    draft: &'a PostDraft,
}

pub struct PostService {
    store: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStore>,
    posts: domains::EntityList<Post>,
}

impl PostService {
    pub fn new(store: Arc<dyn RecordStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            objects,
            posts: Default::default(),
        }
    }

    pub fn posts(&self) -> &domains::EntityList<Post> {
        &self.posts
    }

    /// Category names in use on the loaded posts, first-seen order.
    pub fn category_names(&self) -> Vec<String> {
        distinct(self.posts.iter().flat_map(|p| p.categories.iter()))
    }

    /// Tag names in use on the loaded posts, first-seen order.
    pub fn tag_names(&self) -> Vec<String> {
        distinct(self.posts.iter().flat_map(|p| p.tags.iter()))
    }

    /// Loads every post, newest first.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<()> {
        let posts = Records::<Post>::new(self.store.as_ref())
            .fetch(&Query::all().newest_first())
            .await
            .map_err(ServiceError::read)?;
        self.posts = posts.into();
        self.posts.sort_by_key(|p| std::cmp::Reverse(p.created_at));
        info!(posts = self.posts.len(), "posts loaded");
        Ok(())
    }

    /// Creates a post, or updates the one the form is editing.
    #[instrument(skip(self, form), fields(editing = ?form.target()))]
    pub async fn save(&mut self, form: &PostForm) -> Result<Post> {
        if form.title.trim().is_empty() {
            return Err(ServiceError::Validation("A post needs a title".into()));
        }
        let draft = form.to_draft();
        let records = Records::<Post>::new(self.store.as_ref());

        match form.target() {
            Some(id) => {
                let patch = serde_json::to_value(&draft)
                    .map_err(|e| ServiceError::Write(e.to_string()))?;
                let echoed = records
                    .update_by_id(&id, patch.clone())
                    .await
                    .map_err(ServiceError::write)?;
                if let Some(stored) = echoed.into_iter().next() {
                    self.posts.insert(stored.clone());
                    return Ok(stored);
                }
                if self.posts.merge(&id, &patch)? {
                    if let Some(merged) = self.posts.get(&id) {
                        return Ok(merged.clone());
                    }
                }

                // Written but not loaded here; read the row back.
                let stored = match records.fetch_one(&Query::all().eq("id", id)).await {
                    Ok(stored) => stored,
                    Err(err) => {
                        warn!(post = %id, error = %err, "updated post not read back");
                        draft_post(id, &draft, Utc::now())
                    }
                };
                self.posts.insert(stored.clone());
                Ok(stored)
            }
            None => {
                let row = NewPost {
                    id: Uuid::new_v4(),
                    created_at: Utc::now(),
                    draft: &draft,
                };
                let echoed = records.insert(&row).await.map_err(ServiceError::write)?;
                let stored = echoed
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| draft_post(row.id, &draft, row.created_at));
                self.posts.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: Uuid) -> Result<()> {
        Records::<Post>::new(self.store.as_ref())
            .delete_by_id(&id)
            .await
            .map_err(ServiceError::write)?;
        self.posts.remove(&id);
        Ok(())
    }

    /// Uploads each file to the image bucket and returns the public URLs of
    /// those that made it. Failed files are logged and skipped.
    #[instrument(skip(self, files), fields(files = files.len()))]
    pub async fn upload_images(&self, files: Vec<FileUpload>) -> Vec<String> {
        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            let content_type = file.content_type();
            match self
                .objects
                .upload(
                    buckets::IMAGES,
                    &file.name,
                    file.data,
                    content_type,
                    UploadOptions::default(),
                )
                .await
            {
                Ok(path) => urls.push(self.objects.public_url(buckets::IMAGES, &path)),
                Err(err) => warn!(file = %file.name, error = %err, "image upload skipped"),
            }
        }
        urls
    }

    /// Removes an uploaded image by its public URL. The object name is the
    /// last path segment of the URL, percent-decoded.
    #[instrument(skip(self))]
    pub async fn remove_image(&self, url: &str) -> Result<()> {
        let name = object_name(url)
            .ok_or_else(|| ServiceError::Validation(format!("no file name in {url}")))?;
        self.objects
            .remove(buckets::IMAGES, vec![name])
            .await
            .map_err(ServiceError::write)
    }
}

fn draft_post(id: Uuid, draft: &PostDraft, created_at: chrono::DateTime<Utc>) -> Post {
    Post {
        id,
        title: draft.title.clone(),
        slug: Some(draft.slug.clone()),
        content: draft.content.clone(),
        categories: draft.categories.clone(),
        tags: draft.tags.clone(),
        images: draft.images.clone(),
        created_at,
    }
}

fn object_name(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().filter(|n| !n.is_empty())?;
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|name| name.into_owned())
}

fn distinct<'a>(names: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for name in names {
        if !seen.contains(name) {
            seen.push(name.clone());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockObjectStore, MockRecordStore, RemoteError};
    use serde_json::json;

    fn post_row(id: Uuid, title: &str, created_at: &str, categories: &[&str]) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "content": "<p>body</p>",
            "categories": categories,
            "tags": ["rust"],
            "images": [],
            "created_at": created_at
        })
    }

    fn service(store: MockRecordStore, objects: MockObjectStore) -> PostService {
        PostService::new(Arc::new(store), Arc::new(objects))
    }

    #[tokio::test]
    async fn load_sorts_newest_first_and_derives_names() {
        let older = Uuid::new_v4();
        let newer = Uuid::new_v4();
        let mut store = MockRecordStore::new();
        store.expect_select().returning(move |_, _| {
            Ok(vec![
                post_row(older, "Old", "2024-01-01T00:00:00Z", &["news", "howto"]),
                post_row(newer, "New", "2024-06-01T00:00:00Z", &["howto"]),
            ])
        });

        let mut svc = service(store, MockObjectStore::new());
        svc.load().await.unwrap();

        let ids: Vec<_> = svc.posts().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![newer, older]);
        assert_eq!(svc.category_names(), vec!["howto".to_string(), "news".to_string()]);
        assert_eq!(svc.tag_names(), vec!["rust".to_string()]);
    }

    #[tokio::test]
    async fn new_posts_carry_slug_and_append_locally() {
        let mut store = MockRecordStore::new();
        store
            .expect_insert()
            .withf(|table, rows| {
                table == "posts" && rows[0]["slug"] == "hello-world" && rows[0].get("id").is_some()
            })
            .returning(|_, _| Ok(vec![]));

        let mut svc = service(store, MockObjectStore::new());
        let mut form = PostForm::blank();
        form.title = "Hello World".into();

        let post = svc.save(&form).await.unwrap();
        assert_eq!(post.slug.as_deref(), Some("hello-world"));
        assert_eq!(svc.posts().len(), 1);
    }

    #[tokio::test]
    async fn failed_update_leaves_the_list_untouched() {
        let id = Uuid::new_v4();
        let mut store = MockRecordStore::new();
        store
            .expect_select()
            .returning(move |_, _| Ok(vec![post_row(id, "Old", "2024-01-01T00:00:00Z", &[])]));
        store
            .expect_update()
            .returning(|_, _, _| Err(RemoteError::api(400, "bad request")));

        let mut svc = service(store, MockObjectStore::new());
        svc.load().await.unwrap();

        let mut form = PostForm::editing(svc.posts().get(&id).unwrap());
        form.title = "Renamed".into();
        let err = svc.save(&form).await.unwrap_err();

        assert_eq!(err, ServiceError::Write("bad request".into()));
        assert_eq!(svc.posts().get(&id).unwrap().title, "Old");
    }

    #[tokio::test]
    async fn update_without_echo_merges_the_draft() {
        let id = Uuid::new_v4();
        let mut store = MockRecordStore::new();
        store
            .expect_select()
            .returning(move |_, _| Ok(vec![post_row(id, "Old", "2024-01-01T00:00:00Z", &[])]));
        store.expect_update().returning(|_, _, _| Ok(vec![]));

        let mut svc = service(store, MockObjectStore::new());
        svc.load().await.unwrap();

        let mut form = PostForm::editing(svc.posts().get(&id).unwrap());
        form.title = "Renamed".into();
        let post = svc.save(&form).await.unwrap();
        assert_eq!(post.title, "Renamed");
        assert_eq!(post.slug.as_deref(), Some("renamed"));
    }

    #[tokio::test]
    async fn failed_uploads_are_skipped() {
        let mut objects = MockObjectStore::new();
        objects
            .expect_upload()
            .withf(|_, path, _, _, _| path == "a.png")
            .returning(|_, path, _, _, _| Ok(path.to_string()));
        objects
            .expect_upload()
            .withf(|_, path, _, _, _| path == "b.png")
            .returning(|_, _, _, _, _| Err(RemoteError::api(409, "duplicate")));
        objects
            .expect_public_url()
            .returning(|bucket, path| format!("https://cdn/{bucket}/{path}"));

        let svc = service(MockRecordStore::new(), objects);
        let urls = svc
            .upload_images(vec![
                FileUpload::new("a.png", vec![1u8]),
                FileUpload::new("b.png", vec![2u8]),
            ])
            .await;
        assert_eq!(urls, vec!["https://cdn/images/a.png".to_string()]);
    }

    #[tokio::test]
    async fn remove_image_uses_last_url_segment() {
        let mut objects = MockObjectStore::new();
        objects
            .expect_remove()
            .withf(|bucket, paths| bucket == "images" && paths == &vec!["cat.png".to_string()])
            .times(1)
            .returning(|_, _| Ok(()));

        let svc = service(MockRecordStore::new(), objects);
        svc.remove_image("https://x.supabase.co/storage/v1/object/public/images/cat.png")
            .await
            .unwrap();
        assert!(svc.remove_image("https://x/").await.is_err());
    }

    #[tokio::test]
    async fn remove_image_decodes_the_object_name() {
        let mut objects = MockObjectStore::new();
        objects
            .expect_remove()
            .withf(|_, paths| paths == &vec!["summer #1.png".to_string()])
            .times(1)
            .returning(|_, _| Ok(()));

        let svc = service(MockRecordStore::new(), objects);
        svc.remove_image("https://x.supabase.co/storage/v1/object/public/images/summer%20%231.png")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_of_an_unloaded_post_reads_it_back() {
        let id = Uuid::new_v4();
        let mut store = MockRecordStore::new();
        store.expect_update().times(1).returning(|_, _, _| Ok(vec![]));
        store
            .expect_select()
            .withf(move |table, query| table == "posts" && query.matches(&json!({ "id": id })))
            .times(1)
            .returning(move |_, _| Ok(vec![post_row(id, "Renamed", "2024-01-01T00:00:00Z", &[])]));

        let mut svc = service(store, MockObjectStore::new());
        let existing = Post {
            id,
            title: "Old".into(),
            slug: Some("old".into()),
            content: String::new(),
            categories: vec![],
            tags: vec![],
            images: vec![],
            created_at: Utc::now(),
        };
        let mut form = PostForm::editing(&existing);
        form.title = "Renamed".into();

        let post = svc.save(&form).await.unwrap();
        assert_eq!(post.id, id);
        assert_eq!(post.title, "Renamed");
        assert!(svc.posts().contains(&id));
    }

    #[tokio::test]
    async fn unreadable_update_still_reports_success() {
        let id = Uuid::new_v4();
        let mut store = MockRecordStore::new();
        store.expect_update().returning(|_, _, _| Ok(vec![]));
        store
            .expect_select()
            .returning(|_, _| Err(RemoteError::api(503, "unavailable")));

        let mut svc = service(store, MockObjectStore::new());
        let mut form = PostForm::blank();
        form.title = "Draft".into();
        let mut form = PostForm::editing(&draft_post(id, &form.to_draft(), Utc::now()));
        form.title = "Final".into();

        let post = svc.save(&form).await.unwrap();
        assert_eq!(post.title, "Final");
        assert_eq!(post.slug.as_deref(), Some("final"));
    }

    #[test]
    fn content_type_is_guessed_from_the_name() {
        assert_eq!(FileUpload::new("a.png", Bytes::new()).content_type(), mime::IMAGE_PNG);
        assert_eq!(
            FileUpload::new("blob", Bytes::new()).content_type(),
            mime::APPLICATION_OCTET_STREAM
        );
    }
}
