//! # supabase
//!
//! HTTP plumbing shared by the record, object and identity adapters: one
//! client, the project URL, the anon key and the signed-in session whose
//! token authorizes every request.

mod rest;
mod storage;

pub use rest::{filter_pairs, query_pairs, RestRecordStore};
pub use storage::{object_url, public_object_url, upload_headers, BucketStore};

use std::sync::{Arc, RwLock};

use domains::{RemoteError, RemoteResult, Session};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};

/// Cheap to clone; all clones share the client and the session slot.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
    session: RwLock<Option<Session>>,
}

impl Connection {
    pub fn new(base_url: &str, anon_key: SecretString) -> RemoteResult<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(transport)?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                anon_key,
                session: RwLock::new(None),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// `{base_url}{path}`; `path` starts with `/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    pub fn session(&self) -> Option<Session> {
        self.inner
            .session
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn set_session(&self, session: Option<Session>) {
        let mut slot = self
            .inner
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = session;
    }

    /// `apikey` plus a bearer token: the session's access token when signed
    /// in, the anon key otherwise.
    pub fn headers(&self) -> RemoteResult<HeaderMap> {
        let anon = self.inner.anon_key.expose_secret();
        let bearer = match self.session() {
            Some(session) => session.access_token,
            None => anon.to_string(),
        };

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(anon)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {bearer}"))?);
        Ok(headers)
    }
}

fn header_value(value: &str) -> RemoteResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| RemoteError::Transport(format!("invalid header: {e}")))
}

pub fn transport(err: reqwest::Error) -> RemoteError {
    RemoteError::Transport(err.to_string())
}

/// Passes successful responses through; turns the rest into `RemoteError::Api`.
pub async fn check(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = %status, body = %body, "remote call rejected");
    Err(RemoteError::api(status.as_u16(), error_message(status, &body)))
}

/// Reads a JSON body; an empty body is `Value::Null`.
pub async fn read_json(response: Response) -> RemoteResult<serde_json::Value> {
    let body = response.text().await.map_err(transport)?;
    if body.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

/// The human-readable part of an error body. The record, storage and auth
/// APIs each use a different field for it.
pub fn error_message(status: StatusCode, body: &str) -> String {
    const FIELDS: [&str; 4] = ["message", "msg", "error_description", "error"];

    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            FIELDS
                .iter()
                .find_map(|field| json.get(*field).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string())
        })
}
