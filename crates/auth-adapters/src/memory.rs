//! Accounts held in memory. Sign-in issues an opaque token; sign-out and
//! sign-in broadcast the same events the hosted service does.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use domains::{AuthEvent, AuthUser, IdentityProvider, RemoteError, RemoteResult, Session};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::EVENT_CAPACITY;

const INVALID_CREDENTIALS: &str = "Invalid login credentials";

struct Account {
    password: String,
    user: AuthUser,
}

pub struct MemoryIdentity {
    accounts: DashMap<String, Account>,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            accounts: DashMap::new(),
            session: RwLock::new(None),
            events,
        }
    }
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.add_account(email, password);
        self
    }

    /// Registers an account and returns its user id.
    pub fn add_account(&self, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.accounts.insert(
            email.to_lowercase(),
            Account {
                password: password.to_string(),
                user: AuthUser {
                    id,
                    email: Some(email.to_string()),
                },
            },
        );
        id
    }

    fn set_session(&self, session: Option<Session>) {
        let mut slot = self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = session;
    }

    fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn notify(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> RemoteResult<Session> {
        let user = match self.accounts.get(&email.to_lowercase()) {
            Some(account) if account.password == password => account.user.clone(),
            _ => return Err(RemoteError::api(400, INVALID_CREDENTIALS)),
        };
        let session = Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: None,
            expires_at: Some(Utc::now() + Duration::hours(1)),
            user,
        };
        self.set_session(Some(session.clone()));
        self.notify(AuthEvent::SignedIn);
        Ok(session)
    }

    async fn current_session(&self) -> RemoteResult<Option<Session>> {
        Ok(self.session().filter(|s| !s.is_expired_at(Utc::now())))
    }

    async fn current_user(&self) -> RemoteResult<Option<AuthUser>> {
        Ok(self.current_session().await?.map(|s| s.user))
    }

    async fn sign_out(&self) -> RemoteResult<()> {
        self.set_session(None);
        self.notify(AuthEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_in_checks_the_password() {
        let identity = MemoryIdentity::new().with_account("Admin@Example.com", "hunter2");

        let err = identity
            .sign_in_with_password("admin@example.com", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), INVALID_CREDENTIALS);
        assert_eq!(identity.current_user().await.unwrap(), None);

        let mut events = identity.subscribe();
        let session = identity
            .sign_in_with_password("admin@example.com", "hunter2")
            .await
            .unwrap();
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedIn);
        assert_eq!(identity.current_user().await.unwrap(), Some(session.user));
    }

    #[tokio::test]
    async fn sign_out_clears_the_session() {
        let identity = MemoryIdentity::new().with_account("a@b.c", "pw");
        identity.sign_in_with_password("a@b.c", "pw").await.unwrap();

        let mut events = identity.subscribe();
        identity.sign_out().await.unwrap();
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
        assert_eq!(identity.current_session().await.unwrap(), None);
    }
}
