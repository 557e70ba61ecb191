//! # Entity list reducer
//!
//! A locally held copy of one remote collection, patched after each
//! confirmed write instead of refetched.

use serde_json::Value;

use crate::error::DomainError;
use crate::models::Record;

#[derive(Debug, Clone, PartialEq)]
pub struct EntityList<T> {
    items: Vec<T>,
}

impl<T> Default for EntityList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Record> From<Vec<T>> for EntityList<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T: Record> EntityList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record. A record whose id is already present replaces the
    /// existing entry in place, so ids stay unique.
    pub fn insert(&mut self, record: T) {
        if !self.replace(record.clone()) {
            self.items.push(record);
        }
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = T>) {
        for record in records {
            self.insert(record);
        }
    }

    /// Replaces the entry with the same id. Returns false when none exists.
    pub fn replace(&mut self, record: T) -> bool {
        match self.items.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Overlays the fields of `patch` (a JSON object) onto the entry with
    /// `id`. Returns `Ok(false)` when no entry has that id.
    pub fn merge(&mut self, id: &T::Id, patch: &Value) -> Result<bool, DomainError> {
        let Some(slot) = self.items.iter_mut().find(|r| r.id() == id) else {
            return Ok(false);
        };

        let merge_err = |reason: String| DomainError::Merge {
            table: T::TABLE,
            reason,
        };

        let Value::Object(changes) = patch else {
            return Err(merge_err("patch is not an object".into()));
        };
        let mut current = serde_json::to_value(&*slot).map_err(|e| merge_err(e.to_string()))?;
        let Value::Object(fields) = &mut current else {
            return Err(merge_err("record is not an object".into()));
        };
        for (key, value) in changes {
            fields.insert(key.clone(), value.clone());
        }

        *slot = serde_json::from_value(current).map_err(|e| merge_err(e.to_string()))?;
        Ok(true)
    }

    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let pos = self.items.iter().position(|r| r.id() == id)?;
        Some(self.items.remove(pos))
    }

    /// Keeps the entries matching `keep`; returns how many were dropped.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(keep);
        before - self.items.len()
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|r| r.id() == id)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn sort_by_key<K: Ord>(&mut self, key: impl FnMut(&T) -> K) {
        self.items.sort_by_key(key);
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<'a, T> IntoIterator for &'a EntityList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ad, AdPlacement};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn ad(id: i64, alt: &str) -> Ad {
        Ad {
            id,
            image_url: format!("https://cdn/{id}.png"),
            link_url: "https://shop".into(),
            alt_text: alt.into(),
            placement: AdPlacement::Header,
            created_at: Utc.with_ymd_and_hms(2024, 11, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn insert_appends_and_keeps_ids_unique() {
        let mut list = EntityList::from(vec![ad(1, "a")]);
        list.insert(ad(2, "b"));
        list.insert(ad(1, "a2"));
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(&1).unwrap().alt_text, "a2");
        assert_eq!(list.as_slice()[1].id, 2);
    }

    #[test]
    fn merge_overlays_only_the_given_fields() {
        let mut list = EntityList::from(vec![ad(1, "a"), ad(2, "b")]);
        let merged = list
            .merge(&2, &json!({ "altText": "new", "placement": "sidebar" }))
            .unwrap();
        assert!(merged);

        let second = list.get(&2).unwrap();
        assert_eq!(second.alt_text, "new");
        assert_eq!(second.placement, AdPlacement::Sidebar);
        assert_eq!(second.image_url, "https://cdn/2.png");
        assert_eq!(list.get(&1).unwrap(), &ad(1, "a"));
    }

    #[test]
    fn merge_of_unknown_id_is_a_no_op() {
        let mut list = EntityList::from(vec![ad(1, "a")]);
        assert_eq!(list.merge(&9, &json!({ "altText": "x" })), Ok(false));
    }

    #[test]
    fn merge_rejects_patches_that_break_the_record() {
        let mut list = EntityList::from(vec![ad(1, "a")]);
        let err = list.merge(&1, &json!({ "placement": "banner" })).unwrap_err();
        assert!(matches!(err, DomainError::Merge { table: "ads", .. }));
        assert_eq!(list.get(&1).unwrap().placement, AdPlacement::Header);
    }

    #[test]
    fn remove_and_retain() {
        let mut list = EntityList::from(vec![ad(1, "a"), ad(2, "b"), ad(3, "b")]);
        assert_eq!(list.remove(&1).map(|a| a.id), Some(1));
        assert!(list.remove(&1).is_none());
        assert_eq!(list.retain(|a| a.alt_text != "b"), 2);
        assert!(list.is_empty());
    }
}
