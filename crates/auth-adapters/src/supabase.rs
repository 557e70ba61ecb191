//! Password sign-in, token refresh, user lookup and sign-out against
//! `/auth/v1`. The session lives in the shared `Connection`, so the record
//! and object adapters pick up the user's token as soon as it changes.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use domains::{AuthEvent, AuthUser, IdentityProvider, RemoteResult, Session};
use serde::Deserialize;
use serde_json::json;
use storage_adapters::supabase::{check, read_json, transport};
use storage_adapters::Connection;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::EVENT_CAPACITY;

/// Body of a successful token grant.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds from now.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Unix seconds; preferred over `expires_in` when present.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl TokenResponse {
    pub fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

pub struct SupabaseAuth {
    conn: Connection,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseAuth {
    pub fn new(conn: Connection) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { conn, events }
    }

    /// Puts back a session persisted by an earlier run. No event is sent.
    pub fn restore(&self, session: Session) {
        debug!(user = %session.user.id, "session restored");
        self.conn.set_session(Some(session));
    }

    /// The session as held right now, for persisting between runs.
    pub fn session(&self) -> Option<Session> {
        self.conn.session()
    }

    fn notify(&self, event: AuthEvent) {
        // No receivers is fine; nobody is listening yet.
        let _ = self.events.send(event);
    }

    async fn grant(&self, grant_type: &str, body: serde_json::Value) -> RemoteResult<Session> {
        let url = self.conn.endpoint("/auth/v1/token");
        let response = self
            .conn
            .http()
            .post(&url)
            .query(&[("grant_type", grant_type)])
            .headers(self.conn.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let body = read_json(check(response).await?).await?;
        let token: TokenResponse = serde_json::from_value(body)?;
        Ok(token.into_session(Utc::now()))
    }

    async fn logout(&self) -> RemoteResult<()> {
        let url = self.conn.endpoint("/auth/v1/logout");
        let response = self
            .conn
            .http()
            .post(&url)
            .headers(self.conn.headers()?)
            .send()
            .await
            .map_err(transport)?;
        check(response).await.map(|_| ())
    }

    async fn refresh(&self, refresh_token: &str) -> RemoteResult<Session> {
        let session = self
            .grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await?;
        self.conn.set_session(Some(session.clone()));
        self.notify(AuthEvent::TokenRefreshed);
        Ok(session)
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    #[instrument(skip(self, password))]
    async fn sign_in_with_password(&self, email: &str, password: &str) -> RemoteResult<Session> {
        let session = self
            .grant("password", json!({ "email": email, "password": password }))
            .await?;
        self.conn.set_session(Some(session.clone()));
        info!(user = %session.user.id, "signed in");
        self.notify(AuthEvent::SignedIn);
        Ok(session)
    }

    /// Expired sessions are refreshed once; if that fails, or there is no
    /// refresh token, the session is dropped and `SignedOut` is broadcast.
    async fn current_session(&self) -> RemoteResult<Option<Session>> {
        let Some(session) = self.conn.session() else {
            return Ok(None);
        };
        if !session.is_expired_at(Utc::now()) {
            return Ok(Some(session));
        }
        let Some(refresh_token) = session.refresh_token.as_deref() else {
            debug!("expired session has no refresh token");
            self.conn.set_session(None);
            self.notify(AuthEvent::SignedOut);
            return Ok(None);
        };
        match self.refresh(refresh_token).await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(err) => {
                warn!(error = %err, "session refresh failed");
                self.conn.set_session(None);
                self.notify(AuthEvent::SignedOut);
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> RemoteResult<Option<AuthUser>> {
        if self.current_session().await?.is_none() {
            return Ok(None);
        }
        let url = self.conn.endpoint("/auth/v1/user");
        let response = self
            .conn
            .http()
            .get(&url)
            .headers(self.conn.headers()?)
            .send()
            .await
            .map_err(transport)?;
        let body = read_json(check(response).await?).await?;
        Ok(Some(serde_json::from_value(body)?))
    }

    /// The local session is cleared even when the remote call fails.
    #[instrument(skip(self))]
    async fn sign_out(&self) -> RemoteResult<()> {
        let result = match self.conn.session() {
            Some(_) => self.logout().await,
            None => Ok(()),
        };
        self.conn.set_session(None);
        self.notify(AuthEvent::SignedOut);
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
