//! # services
//!
//! Use cases of the content admin. Each service owns the view state of one
//! screen and only touches it after the remote call it depends on has
//! succeeded.

pub mod ads;
pub mod auth;
pub mod comments;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod posts;
pub mod profile;
pub mod taxonomy;

pub use ads::AdService;
pub use auth::{AuthService, SessionGuard};
pub use comments::CommentService;
pub use context::AppContext;
pub use dashboard::{CommentWithReplies, Dashboard, DashboardService};
pub use error::{Result, ServiceError, Surface};
pub use posts::{FileUpload, PostService};
pub use profile::ProfileService;
pub use taxonomy::TaxonomyService;
