//! Sign-in/sign-out and the session guard in front of protected routes.

use std::sync::Arc;

use domains::{decide, GateState, IdentityProvider, Navigation, Route, Session};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, ServiceError};

const MISSING_CREDENTIALS: &str = "Enter your email and password";

pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
}

impl AuthService {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    /// A failed sign-in is an inline form error; the caller stays on the
    /// login route.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::Auth(MISSING_CREDENTIALS.into()));
        }
        let session = self
            .identity
            .sign_in_with_password(email, password)
            .await
            .map_err(ServiceError::auth)?;
        info!(user = %session.user.id, "signed in");
        Ok(session)
    }

    /// Signs out and returns where to go next. A failed remote sign-out is
    /// logged; the user is sent to the login route regardless.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Route {
        match self.identity.sign_out().await {
            Ok(()) => info!("signed out"),
            Err(err) => warn!(error = %err, "sign-out failed"),
        }
        Route::Login
    }
}

/// Tracks whether a session is active and answers routing questions.
///
/// Owns the task that listens for session changes; the task stops when the
/// guard is shut down or dropped.
pub struct SessionGuard {
    state: watch::Receiver<GateState>,
    task: JoinHandle<()>,
}

impl SessionGuard {
    /// Starts in [`GateState::Checking`], runs the first session check, then
    /// re-checks on every session-change event.
    pub fn start(identity: Arc<dyn IdentityProvider>) -> Self {
        let (tx, state) = watch::channel(GateState::Checking);
        // Subscribe before the first check so no event slips between them.
        let mut events = identity.subscribe();

        let task = tokio::spawn(async move {
            tx.send_replace(check(identity.as_ref()).await);
            loop {
                match events.recv().await {
                    Ok(event) => debug!(?event, "session changed"),
                    Err(RecvError::Lagged(skipped)) => debug!(skipped, "session events lagged"),
                    Err(RecvError::Closed) => break,
                }
                tx.send_replace(check(identity.as_ref()).await);
            }
            debug!("session event stream closed");
        });

        Self { state, task }
    }

    pub fn state(&self) -> GateState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<GateState> {
        self.state.clone()
    }

    /// Waits until the first check has resolved.
    pub async fn settled(&self) -> GateState {
        let mut state = self.state.clone();
        let settled = match state.wait_for(|s| *s != GateState::Checking).await {
            Ok(settled) => settled.clone(),
            // The listener is gone before it ever decided; treat as signed out.
            Err(_) => GateState::Unauthenticated,
        };
        settled
    }

    /// Routing decision for the current state, without waiting.
    pub fn navigate(&self, route: Route) -> Navigation {
        decide(&self.state.borrow(), route)
    }

    /// Routing decision once the first check has resolved.
    pub async fn resolve(&self, route: Route) -> Navigation {
        decide(&self.settled().await, route)
    }

    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn check(identity: &dyn IdentityProvider) -> GateState {
    match identity.current_session().await {
        Ok(Some(session)) => GateState::Authenticated(session.user),
        Ok(None) => GateState::Unauthenticated,
        Err(err) => {
            warn!(error = %err, "session check failed");
            GateState::Unauthenticated
        }
    }
}
