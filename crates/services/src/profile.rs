//! The signed-in user's own profile row.

use std::sync::Arc;

use domains::{
    buckets, Filter, IdentityProvider, ObjectStore, ProfileChanges, Query, RecordStore, Records,
    UploadOptions, UserProfile,
};
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::{Result, ServiceError};
use crate::posts::FileUpload;

const NOT_SIGNED_IN: &str = "You must be logged in to view your profile.";
const NOT_LOADED: &str = "Profile is not loaded";
const IMAGE_CACHE_SECONDS: &str = "3600";

pub struct ProfileService {
    store: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStore>,
    identity: Arc<dyn IdentityProvider>,
    profile: Option<UserProfile>,
}

impl ProfileService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            store,
            objects,
            identity,
            profile: None,
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<&UserProfile> {
        let user = self
            .identity
            .current_user()
            .await
            .map_err(ServiceError::read)?
            .ok_or_else(|| ServiceError::Auth(NOT_SIGNED_IN.into()))?;

        let profile = Records::<UserProfile>::new(self.store.as_ref())
            .fetch_one(&Query::all().filter(Filter::eq("id", user.id)))
            .await
            .map_err(ServiceError::read)?;
        Ok(self.profile.insert(profile))
    }

    /// Writes the changed fields, uploading `image` first when given. The
    /// email is never part of the update.
    #[instrument(skip(self, changes, image), fields(image = image.is_some()))]
    pub async fn save(
        &mut self,
        changes: &ProfileChanges,
        image: Option<FileUpload>,
    ) -> Result<UserProfile> {
        let current = self
            .profile
            .as_ref()
            .ok_or_else(|| ServiceError::Validation(NOT_LOADED.into()))?;
        let id = current.id;

        let mut patch =
            serde_json::to_value(changes).map_err(|e| ServiceError::Write(e.to_string()))?;
        if let Some(file) = image {
            let url = self.upload_image(id, file).await?;
            if let Value::Object(fields) = &mut patch {
                fields.insert("profile_image".into(), Value::String(url));
            }
        }

        Records::<UserProfile>::new(self.store.as_ref())
            .update_by_id(&id, patch.clone())
            .await
            .map_err(ServiceError::write)?;

        let profile = self
            .profile
            .as_mut()
            .ok_or_else(|| ServiceError::Validation(NOT_LOADED.into()))?;
        apply(profile, changes, &patch);
        info!(user = %id, "profile updated");
        Ok(profile.clone())
    }

    async fn upload_image(&self, user_id: uuid::Uuid, file: FileUpload) -> Result<String> {
        let content_type = file.content_type();
        let path = format!("{}/{user_id}/{}", buckets::PROFILE_IMAGES, file.name);
        let stored = self
            .objects
            .upload(
                buckets::PROFILE_IMAGES,
                &path,
                file.data,
                content_type,
                UploadOptions {
                    upsert: true,
                    cache_control: Some(IMAGE_CACHE_SECONDS.into()),
                },
            )
            .await
            .map_err(ServiceError::write)?;
        Ok(self.objects.public_url(buckets::PROFILE_IMAGES, &stored))
    }
}

fn apply(profile: &mut UserProfile, changes: &ProfileChanges, patch: &Value) {
    if let Some(name) = &changes.full_name {
        profile.full_name = Some(name.clone());
    }
    if let Some(phone) = &changes.phone_number {
        profile.phone_number = Some(phone.clone());
    }
    if let Some(status) = &changes.status {
        profile.status = Some(status.clone());
    }
    if let Some(url) = patch.get("profile_image").and_then(Value::as_str) {
        profile.profile_image = Some(url.to_string());
    }
}
