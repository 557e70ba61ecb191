//! # Errors
//!
//! Failure types shared by every crate in the workspace.
//! Adapters speak `RemoteError`; pure domain logic speaks `DomainError`.

use thiserror::Error;

/// Failure of a call against the remote platform.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The platform answered with an error body (e.g., RLS rejection, bad credentials).
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, connection reset).
    #[error("request failed: {0}")]
    Transport(String),

    /// The response arrived but its shape did not match the record type.
    #[error("unexpected response shape: {0}")]
    Decode(String),

    /// A single-row read matched nothing.
    #[error("{0} not found")]
    NotFound(String),
}

impl RemoteError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Failure of in-memory domain logic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Placement string outside the recognised set.
    #[error("unknown ad placement: {0}")]
    UnknownPlacement(String),

    /// A patch could not be merged into an existing record.
    #[error("could not merge changes into {table} record: {reason}")]
    Merge { table: &'static str, reason: String },
}

/// A specialized Result type for remote calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;
