//! # domains
//!
//! Typed records, port traits and the pure list/tree logic of the content
//! admin. Nothing in here performs I/O; adapters implement the ports.

pub mod comment_tree;
pub mod error;
pub mod list;
pub mod models;
pub mod navigation;
pub mod ports;
pub mod post_form;
pub mod query;
pub mod records;

// Re-exporting for easier access in other crates
pub use comment_tree::*;
pub use error::*;
pub use list::*;
pub use models::*;
pub use navigation::*;
pub use ports::*;
pub use post_form::*;
pub use query::*;
pub use records::*;
