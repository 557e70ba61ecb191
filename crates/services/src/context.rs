//! # AppContext
//!
//! Holds the adapters behind their ports and the one session guard of the
//! application. Services are built on demand and share the adapters.

use std::sync::Arc;

use domains::{IdentityProvider, Navigation, ObjectStore, RecordStore, Route};

use crate::ads::AdService;
use crate::auth::{AuthService, SessionGuard};
use crate::comments::CommentService;
use crate::dashboard::DashboardService;
use crate::posts::PostService;
use crate::profile::ProfileService;
use crate::taxonomy::TaxonomyService;

pub struct AppContext {
    store: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStore>,
    identity: Arc<dyn IdentityProvider>,
    guard: SessionGuard,
}

impl AppContext {
    /// Wires the adapters and starts the session guard. Needs a running
    /// tokio runtime.
    pub fn new(
        store: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let guard = SessionGuard::start(identity.clone());
        Self {
            store,
            objects,
            identity,
            guard,
        }
    }

    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    /// Where a request for `route` ends up once the session is known.
    pub async fn enter(&self, route: Route) -> Navigation {
        let navigation = self.guard.resolve(route).await;
        tracing::debug!(%route, ?navigation, "route resolved");
        navigation
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.identity.clone())
    }

    pub fn comments(&self) -> CommentService {
        CommentService::new(self.store.clone(), self.identity.clone())
    }

    pub fn posts(&self) -> PostService {
        PostService::new(self.store.clone(), self.objects.clone())
    }

    pub fn taxonomy(&self) -> TaxonomyService {
        TaxonomyService::new(self.store.clone())
    }

    pub fn ads(&self) -> AdService {
        AdService::new(self.store.clone())
    }

    pub fn profile(&self) -> ProfileService {
        ProfileService::new(self.store.clone(), self.objects.clone(), self.identity.clone())
    }

    pub fn dashboard(&self) -> DashboardService {
        DashboardService::new(self.store.clone())
    }

    /// Stops the session listener. Dropping the context does the same.
    pub fn shutdown(self) {
        self.guard.shutdown();
    }
}
