use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use dashmap::DashMap;
use domains::{Direction, Filter, Query, RecordStore, RemoteError, RemoteResult};
use serde_json::{Map, Value};
use tracing::debug;

use super::Op;

/// Tables of JSON rows keyed by name.
///
/// Inserted rows without an `id` get the next integer id, and rows without
/// `created_at` get the current time, the way the hosted tables default them.
pub struct MemoryRecordStore {
    tables: DashMap<String, Vec<Value>>,
    failures: DashMap<(Op, String), String>,
    next_id: AtomicI64,
    echo_writes: AtomicBool,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self {
            tables: DashMap::new(),
            failures: DashMap::new(),
            next_id: AtomicI64::new(1),
            echo_writes: AtomicBool::new(true),
        }
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.tables.entry(table.to_string()).or_default().extend(rows);
        self
    }

    /// Snapshot of a table in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .get(table)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    /// Makes every `op` on `table` fail with an API error carrying `message`.
    pub fn fail_on(&self, op: Op, table: &str, message: &str) {
        self.failures
            .insert((op, table.to_string()), message.to_string());
    }

    pub fn clear_failures(&self) {
        self.failures.clear();
    }

    /// Whether inserts and updates return the written rows.
    pub fn echo_writes(&self, echo: bool) {
        self.echo_writes.store(echo, AtomicOrdering::SeqCst);
    }

    fn injected(&self, op: Op, table: &str) -> RemoteResult<()> {
        match self.failures.get(&(op, table.to_string())) {
            Some(message) => {
                debug!(%op, table, "injected failure");
                Err(RemoteError::api(500, message.value().clone()))
            }
            None => Ok(()),
        }
    }

    fn echo(&self, rows: Vec<Value>) -> Vec<Value> {
        if self.echo_writes.load(AtomicOrdering::SeqCst) {
            rows
        } else {
            Vec::new()
        }
    }

    fn with_defaults(&self, row: Value) -> RemoteResult<Value> {
        let Value::Object(mut fields) = row else {
            return Err(RemoteError::Decode(format!("row is not an object: {row}")));
        };
        if !fields.contains_key("id") {
            let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
            fields.insert("id".into(), Value::from(id));
        }
        if !fields.contains_key("created_at") {
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
            fields.insert("created_at".into(), Value::String(now));
        }
        Ok(Value::Object(fields))
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        // Nulls sort last, as in the remote default.
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn project(row: &Value, columns: Option<&str>) -> Value {
    let Some(columns) = columns.filter(|c| c.trim() != "*") else {
        return row.clone();
    };
    let mut picked = Map::new();
    for column in columns.split(',').map(str::trim) {
        if let Some(value) = row.get(column) {
            picked.insert(column.to_string(), value.clone());
        }
    }
    Value::Object(picked)
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn select(&self, table: &str, query: &Query) -> RemoteResult<Vec<Value>> {
        self.injected(Op::Select, table)?;
        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| query.matches(row))
            .collect();
        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows
            .iter()
            .map(|row| project(row, query.columns.as_deref()))
            .collect())
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> RemoteResult<Vec<Value>> {
        self.injected(Op::Insert, table)?;
        let rows = rows
            .into_iter()
            .map(|row| self.with_defaults(row))
            .collect::<RemoteResult<Vec<_>>>()?;
        self.tables
            .entry(table.to_string())
            .or_default()
            .extend(rows.iter().cloned());
        Ok(self.echo(rows))
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> RemoteResult<Vec<Value>> {
        self.injected(Op::Update, table)?;
        let Value::Object(changes) = patch else {
            return Err(RemoteError::Decode(format!("patch is not an object: {patch}")));
        };
        let mut updated = Vec::new();
        if let Some(mut rows) = self.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| filter.matches(row)) {
                if let Value::Object(fields) = row {
                    fields.extend(changes.clone());
                }
                updated.push(row.clone());
            }
        }
        Ok(self.echo(updated))
    }

    async fn delete(&self, table: &str, filter: &Filter) -> RemoteResult<()> {
        self.injected(Op::Delete, table)?;
        if let Some(mut rows) = self.tables.get_mut(table) {
            rows.retain(|row| !filter.matches(row));
        }
        Ok(())
    }
}
