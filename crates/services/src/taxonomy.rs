//! Categories and tags offered by the post editor.

use std::sync::Arc;

use domains::{Category, EntityList, Query, Record, RecordStore, Records, Tag};
use serde_json::json;
use tracing::instrument;

use crate::error::{Result, ServiceError};

pub struct TaxonomyService {
    store: Arc<dyn RecordStore>,
    categories: EntityList<Category>,
    tags: EntityList<Tag>,
}

impl TaxonomyService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            categories: EntityList::new(),
            tags: EntityList::new(),
        }
    }

    pub fn categories(&self) -> &EntityList<Category> {
        &self.categories
    }

    pub fn tags(&self) -> &EntityList<Tag> {
        &self.tags
    }

    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<()> {
        let store = self.store.as_ref();
        let categories = Records::<Category>::new(store)
            .fetch(&Query::all())
            .await
            .map_err(ServiceError::read)?;
        let tags = Records::<Tag>::new(store)
            .fetch(&Query::all())
            .await
            .map_err(ServiceError::read)?;
        self.categories = categories.into();
        self.tags = tags.into();
        Ok(())
    }

    /// Adds a category. Blank names are ignored and yield `None`.
    pub async fn add_category(&mut self, name: &str) -> Result<Option<Category>> {
        let added = add_named::<Category>(self.store.as_ref(), name).await?;
        if let Some(category) = &added {
            self.categories.insert(category.clone());
        }
        Ok(added)
    }

    /// Adds a tag. Blank names are ignored and yield `None`.
    pub async fn add_tag(&mut self, name: &str) -> Result<Option<Tag>> {
        let added = add_named::<Tag>(self.store.as_ref(), name).await?;
        if let Some(tag) = &added {
            self.tags.insert(tag.clone());
        }
        Ok(added)
    }
}

/// Ids are assigned remotely, so only an echoed row can join the local list.
async fn add_named<T: Record>(store: &dyn RecordStore, name: &str) -> Result<Option<T>> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }
    let echoed = Records::<T>::new(store)
        .insert(&json!({ "name": name }))
        .await
        .map_err(ServiceError::write)?;
    if echoed.is_empty() {
        tracing::debug!(table = T::TABLE, "insert not echoed; local list unchanged");
    }
    Ok(echoed.into_iter().next())
}
