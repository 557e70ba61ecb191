//! # integration-tests
//!
//! Fixtures shared by the end-to-end tests: a backend made of the in-memory
//! adapters, seeded with rows shaped like the hosted tables.

use std::sync::Arc;

use auth_adapters::MemoryIdentity;
use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Value};
use services::AppContext;
use storage_adapters::{MemoryObjectStore, MemoryRecordStore};
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct horse";
pub const ADMIN_NAME: &str = "Site Admin";
pub const PUBLIC_BASE: &str = "http://memory.local";

pub struct Backend {
    pub records: Arc<MemoryRecordStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub identity: Arc<MemoryIdentity>,
    pub admin: Uuid,
}

impl Backend {
    /// One admin account with its `users` row, plus the given tables.
    pub fn with_tables(tables: Vec<(&str, Vec<Value>)>) -> Self {
        let identity = MemoryIdentity::new();
        let admin = identity.add_account(ADMIN_EMAIL, ADMIN_PASSWORD);

        let mut records = MemoryRecordStore::new().with_rows(
            "users",
            vec![json!({
                "id": admin,
                "full_name": ADMIN_NAME,
                "email": ADMIN_EMAIL,
                "profile_image": null,
                "phone_number": "555-0100",
                "status": "active",
            })],
        );
        for (table, rows) in tables {
            records = records.with_rows(table, rows);
        }

        Self {
            records: Arc::new(records),
            objects: Arc::new(MemoryObjectStore::new(PUBLIC_BASE)),
            identity: Arc::new(identity),
            admin,
        }
    }

    pub fn empty() -> Self {
        Self::with_tables(Vec::new())
    }

    /// Wires the services over this backend. Needs a running runtime.
    pub fn context(&self) -> AppContext {
        AppContext::new(
            self.records.clone(),
            self.objects.clone(),
            self.identity.clone(),
        )
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.records.rows(table)
    }

    /// Ids of every row in `table`, as strings.
    pub fn ids(&self, table: &str) -> Vec<String> {
        self.rows(table)
            .iter()
            .filter_map(|row| match &row["id"] {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect()
    }
}

/// A fixed point in time `minutes` after the fixture epoch.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 1, 9, 0, 0)
        .single()
        .unwrap_or_default()
        + Duration::minutes(minutes)
}

fn stamp(minutes: i64) -> String {
    at(minutes).to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn post_row(id: Uuid, title: &str, minutes: i64) -> Value {
    json!({
        "id": id,
        "title": title,
        "slug": title.to_lowercase().replace(' ', "-"),
        "content": format!("<p>{title}</p>"),
        "categories": ["News"],
        "tags": null,
        "images": [],
        "created_at": stamp(minutes),
    })
}

pub fn comment_row(id: Uuid, post_id: Uuid, content: &str, minutes: i64) -> Value {
    json!({
        "id": id,
        "post_id": post_id,
        "content": content,
        "user_id": Uuid::nil(),
        "user_name": "Reader",
        "user_email": "reader@example.com",
        "created_at": stamp(minutes),
    })
}

pub fn reply_row(id: Uuid, comment_id: Uuid, content: &str, minutes: i64) -> Value {
    json!({
        "id": id,
        "comment_id": comment_id,
        "content": content,
        "user_id": Uuid::nil(),
        "user_name": ADMIN_NAME,
        "user_email": ADMIN_EMAIL,
        "created_at": stamp(minutes),
    })
}

pub fn ad_row(id: i64, placement: &str, minutes: i64) -> Value {
    json!({
        "id": id,
        "imageUrl": format!("https://cdn.example.com/ad-{id}.png"),
        "linkUrl": format!("https://shop.example.com/{id}"),
        "altText": format!("Ad {id}"),
        "placement": placement,
        "created_at": stamp(minutes),
    })
}
