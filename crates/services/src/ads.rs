//! Ad management. The local list only changes after the remote write
//! resolves successfully.

use std::sync::Arc;

use domains::{Ad, AdDraft, EntityList, Query, RecordStore, Records};
use tracing::{debug, instrument};

use crate::error::{Result, ServiceError};

pub struct AdService {
    store: Arc<dyn RecordStore>,
    ads: EntityList<Ad>,
}

impl AdService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            ads: EntityList::new(),
        }
    }

    pub fn ads(&self) -> &EntityList<Ad> {
        &self.ads
    }

    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<()> {
        let ads = Records::<Ad>::new(self.store.as_ref())
            .fetch(&Query::all().newest_first())
            .await
            .map_err(ServiceError::read)?;
        self.ads = ads.into();
        Ok(())
    }

    /// Inserts a new ad and appends the echoed rows. Ad ids are assigned
    /// remotely, so nothing is appended when the store echoes nothing.
    #[instrument(skip(self, draft), fields(placement = %draft.placement))]
    pub async fn create(&mut self, draft: &AdDraft) -> Result<Vec<Ad>> {
        let echoed = Records::<Ad>::new(self.store.as_ref())
            .insert(draft)
            .await
            .map_err(ServiceError::write)?;
        if echoed.is_empty() {
            debug!("ad insert not echoed; local list unchanged");
        }
        self.ads.extend(echoed.iter().cloned());
        Ok(echoed)
    }

    /// Writes the draft's fields to ad `id`, then overlays exactly those
    /// fields onto the local copy.
    #[instrument(skip(self, draft))]
    pub async fn update(&mut self, id: i64, draft: &AdDraft) -> Result<Option<Ad>> {
        let patch = serde_json::to_value(draft).map_err(|e| ServiceError::Write(e.to_string()))?;
        Records::<Ad>::new(self.store.as_ref())
            .update_by_id(&id, patch.clone())
            .await
            .map_err(ServiceError::write)?;
        self.ads.merge(&id, &patch)?;
        Ok(self.ads.get(&id).cloned())
    }

    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: i64) -> Result<()> {
        Records::<Ad>::new(self.store.as_ref())
            .delete_by_id(&id)
            .await
            .map_err(ServiceError::write)?;
        self.ads.remove(&id);
        Ok(())
    }
}
