//! Typed view over a `RecordStore` collection.

use std::marker::PhantomData;

use serde::Serialize;
use serde_json::Value;

use crate::error::{RemoteError, RemoteResult};
use crate::models::Record;
use crate::ports::RecordStore;
use crate::query::{Filter, Query};

/// Translates loose remote rows into `T` and drafts into rows.
pub struct Records<'a, T> {
    store: &'a dyn RecordStore,
    _record: PhantomData<fn() -> T>,
}

impl<'a, T: Record> Records<'a, T> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    pub async fn fetch(&self, query: &Query) -> RemoteResult<Vec<T>> {
        let rows = self.store.select(T::TABLE, query).await?;
        decode_rows(rows)
    }

    /// Exactly one row matching `query`.
    pub async fn fetch_one(&self, query: &Query) -> RemoteResult<T> {
        let mut rows = self.fetch(query).await?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(RemoteError::NotFound(T::TABLE.to_string())),
            n => Err(RemoteError::Decode(format!(
                "expected a single {} row, got {n}",
                T::TABLE
            ))),
        }
    }

    /// Inserts one draft and decodes whatever the store echoes back.
    pub async fn insert<D: Serialize + Sync>(&self, draft: &D) -> RemoteResult<Vec<T>> {
        let row = serde_json::to_value(draft)?;
        let echoed = self.store.insert(T::TABLE, vec![row]).await?;
        decode_rows(echoed)
    }

    pub async fn update_by_id(&self, id: &T::Id, patch: Value) -> RemoteResult<Vec<T>> {
        let echoed = self
            .store
            .update(T::TABLE, &Filter::eq("id", id), patch)
            .await?;
        decode_rows(echoed)
    }

    pub async fn delete_by_id(&self, id: &T::Id) -> RemoteResult<()> {
        self.delete_where(&Filter::eq("id", id)).await
    }

    pub async fn delete_where(&self, filter: &Filter) -> RemoteResult<()> {
        self.store.delete(T::TABLE, filter).await
    }
}

fn decode_rows<T: Record>(rows: Vec<Value>) -> RemoteResult<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row)
                .map_err(|e| RemoteError::Decode(format!("{}: {e}", T::TABLE)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::ports::MockRecordStore;
    use serde_json::json;

    #[tokio::test]
    async fn fetch_one_requires_exactly_one_row() {
        let mut store = MockRecordStore::new();
        store.expect_select().returning(|_, _| Ok(vec![]));

        let records = Records::<Category>::new(&store);
        let result = records.fetch_one(&Query::all().eq("id", 1)).await;
        assert_eq!(result, Err(RemoteError::NotFound("categories".into())));
    }

    #[tokio::test]
    async fn rows_of_the_wrong_shape_are_decode_errors() {
        let mut store = MockRecordStore::new();
        store
            .expect_select()
            .returning(|_, _| Ok(vec![json!({ "id": "not-a-number", "name": "x" })]));

        let records = Records::<Category>::new(&store);
        let result = records.fetch(&Query::all()).await;
        assert!(matches!(result, Err(RemoteError::Decode(msg)) if msg.starts_with("categories")));
    }

    #[tokio::test]
    async fn insert_sends_the_draft_as_a_single_row() {
        let mut store = MockRecordStore::new();
        store
            .expect_insert()
            .withf(|table, rows| table == "categories" && rows == &vec![json!({ "name": "rust" })])
            .returning(|_, _| Ok(vec![json!({ "id": 3, "name": "rust" })]));

        let records = Records::<Category>::new(&store);
        let echoed = records.insert(&json!({ "name": "rust" })).await.unwrap();
        assert_eq!(echoed, vec![Category { id: 3, name: "rust".into() }]);
    }
}
