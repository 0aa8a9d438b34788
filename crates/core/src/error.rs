//! Errors raised by the shared primitives.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Failure of a core primitive: a malformed key or a stale write against a
/// ledger stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Empty code or name, malformed uuid.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The stream head moved since it was read.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
