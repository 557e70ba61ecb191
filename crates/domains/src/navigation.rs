//! Routes of the admin and the session gate in front of them.

use std::fmt;

use uuid::Uuid;

use crate::models::AuthUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    ManagePosts,
    CreatePost,
    EditPost(Uuid),
    ManageComments,
    ManageAds,
    Profile,
    NotFound,
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Dashboard,
            "/login" => Route::Login,
            "/manage-posts" => Route::ManagePosts,
            "/create-post" => Route::CreatePost,
            "/manage-comments" => Route::ManageComments,
            "/manage-ads" => Route::ManageAds,
            "/profile" => Route::Profile,
            other => other
                .strip_prefix("/edit-post/")
                .and_then(|id| Uuid::parse_str(id).ok())
                .map(Route::EditPost)
                .unwrap_or(Route::NotFound),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".into(),
            Route::Dashboard => "/".into(),
            Route::ManagePosts => "/manage-posts".into(),
            Route::CreatePost => "/create-post".into(),
            Route::EditPost(id) => format!("/edit-post/{id}"),
            Route::ManageComments => "/manage-comments".into(),
            Route::ManageAds => "/manage-ads".into(),
            Route::Profile => "/profile".into(),
            Route::NotFound => "/404".into(),
        }
    }

    /// Routes that only render behind an active session.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login | Route::NotFound)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Session gate state. Starts in `Checking` until the first session check resolves.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GateState {
    #[default]
    Checking,
    Authenticated(AuthUser),
    Unauthenticated,
}

impl GateState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, GateState::Authenticated(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Session check still in flight; render nothing yet.
    Pending,
    Render(Route),
    Redirect(Route),
}

/// What to show for `route` given the gate state.
pub fn decide(state: &GateState, route: Route) -> Navigation {
    match (route.is_protected(), state) {
        (false, GateState::Authenticated(_)) if route == Route::Login => {
            Navigation::Redirect(Route::Dashboard)
        }
        (false, _) => Navigation::Render(route),
        (true, GateState::Checking) => Navigation::Pending,
        (true, GateState::Authenticated(_)) => Navigation::Render(route),
        (true, GateState::Unauthenticated) => Navigation::Redirect(Route::Login),
    }
}
