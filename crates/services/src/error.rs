//! # ServiceError
//!
//! Every failure leaves a service as a plain message plus the place the
//! view shows it. Nothing is retried; transient and permanent remote
//! failures are treated alike.

use domains::{DomainError, RemoteError};
use thiserror::Error;

/// Where a failure is shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Replaces the whole view (failed initial load).
    FullView,
    /// Short-lived message; prior local state stays as it was.
    Transient,
    /// Shown next to the form that caused it; no navigation.
    InlineForm,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// A remote read failed.
    #[error("{0}")]
    Read(String),

    /// A remote write failed; nothing local was changed for that step.
    #[error("{0}")]
    Write(String),

    /// Sign-in failed or the action needs a signed-in user.
    #[error("{0}")]
    Auth(String),

    /// Input rejected before any remote call.
    #[error("{0}")]
    Validation(String),
}

impl ServiceError {
    pub fn surface(&self) -> Surface {
        match self {
            ServiceError::Read(_) => Surface::FullView,
            ServiceError::Write(_) | ServiceError::Validation(_) => Surface::Transient,
            ServiceError::Auth(_) => Surface::InlineForm,
        }
    }

    /// The text assigned to the view's error slot.
    pub fn message(&self) -> &str {
        match self {
            ServiceError::Read(m)
            | ServiceError::Write(m)
            | ServiceError::Auth(m)
            | ServiceError::Validation(m) => m,
        }
    }

    pub(crate) fn read(err: RemoteError) -> Self {
        tracing::warn!(error = %err, "remote read failed");
        ServiceError::Read(err.to_string())
    }

    pub(crate) fn write(err: RemoteError) -> Self {
        tracing::warn!(error = %err, "remote write failed");
        ServiceError::Write(err.to_string())
    }

    pub(crate) fn auth(err: RemoteError) -> Self {
        tracing::warn!(error = %err, "authentication failed");
        ServiceError::Auth(err.to_string())
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        ServiceError::Write(err.to_string())
    }
}

/// A specialized Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
