//! `RecordStore` over the PostgREST-style record API at `/rest/v1/{table}`.

use async_trait::async_trait;
use domains::{Direction, Filter, Query, RecordStore, RemoteError, RemoteResult};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{check, read_json, transport, Connection};

const PREFER_REPRESENTATION: &str = "return=representation";

pub struct RestRecordStore {
    conn: Connection,
}

impl RestRecordStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    async fn send(
        &self,
        method: Method,
        table: &str,
        params: Vec<(String, String)>,
        body: Option<Value>,
    ) -> RemoteResult<Value> {
        let url = self.conn.endpoint(&format!("/rest/v1/{table}"));
        debug!(%method, %url, ?params, "record request");

        let mut request = self
            .conn
            .http()
            .request(method.clone(), &url)
            .headers(self.conn.headers()?)
            .query(&params);
        if method != Method::GET && method != Method::DELETE {
            request = request.header("Prefer", PREFER_REPRESENTATION);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = check(request.send().await.map_err(transport)?).await?;
        read_json(response).await
    }
}

/// `select`, one `col=eq.value` per filter, `order=col.asc|desc`, `limit`.
pub fn query_pairs(query: &Query) -> Vec<(String, String)> {
    let mut pairs = vec![(
        "select".to_string(),
        query.columns.clone().unwrap_or_else(|| "*".to_string()),
    )];
    pairs.extend(query.filters.iter().flat_map(filter_pairs));
    if let Some(order) = &query.order {
        let dir = match order.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        pairs.push(("order".to_string(), format!("{}.{dir}", order.column)));
    }
    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }
    pairs
}

pub fn filter_pairs(filter: &Filter) -> Vec<(String, String)> {
    vec![(filter.column.clone(), format!("eq.{}", filter.value))]
}

/// Rows from a response body. Null means nothing was echoed.
fn rows(body: Value) -> RemoteResult<Vec<Value>> {
    match body {
        Value::Null => Ok(Vec::new()),
        Value::Array(rows) => Ok(rows),
        Value::Object(_) => Ok(vec![body]),
        other => Err(RemoteError::Decode(format!("expected rows, got {other}"))),
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    #[instrument(skip(self, query))]
    async fn select(&self, table: &str, query: &Query) -> RemoteResult<Vec<Value>> {
        rows(self.send(Method::GET, table, query_pairs(query), None).await?)
    }

    #[instrument(skip(self, rows_in), fields(rows = rows_in.len()))]
    async fn insert(&self, table: &str, rows_in: Vec<Value>) -> RemoteResult<Vec<Value>> {
        rows(
            self.send(Method::POST, table, Vec::new(), Some(Value::Array(rows_in)))
                .await?,
        )
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> RemoteResult<Vec<Value>> {
        rows(
            self.send(Method::PATCH, table, filter_pairs(filter), Some(patch))
                .await?,
        )
    }

    #[instrument(skip(self))]
    async fn delete(&self, table: &str, filter: &Filter) -> RemoteResult<()> {
        self.send(Method::DELETE, table, filter_pairs(filter), None)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bare_query_selects_everything() {
        assert_eq!(query_pairs(&Query::all()), pairs(&[("select", "*")]));
    }

    #[test]
    fn full_query_maps_every_part() {
        let q = Query::all()
            .columns("id,title,created_at")
            .eq("comment_id", "c1")
            .newest_first()
            .limit(10);
        assert_eq!(
            query_pairs(&q),
            pairs(&[
                ("select", "id,title,created_at"),
                ("comment_id", "eq.c1"),
                ("order", "created_at.desc"),
                ("limit", "10"),
            ])
        );
        assert_eq!(
            query_pairs(&Query::all().oldest_first()),
            pairs(&[("select", "*"), ("order", "created_at.asc")])
        );
    }

    #[test]
    fn filters_map_to_eq_operators() {
        assert_eq!(filter_pairs(&Filter::eq("id", 7)), pairs(&[("id", "eq.7")]));
    }

    #[test]
    fn response_bodies_become_rows() {
        assert_eq!(rows(Value::Null).unwrap(), Vec::<Value>::new());
        assert_eq!(rows(json!([{ "id": 1 }])).unwrap(), vec![json!({ "id": 1 })]);
        assert_eq!(rows(json!({ "id": 1 })).unwrap(), vec![json!({ "id": 1 })]);
        assert!(matches!(rows(json!(3)), Err(RemoteError::Decode(_))));
    }
}
