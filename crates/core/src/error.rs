//! Error model for authorization decisions and their collaborators.

use thiserror::Error;

/// Result type used across the authorization crates.
pub type EntrustResult<T> = Result<T, EntrustError>;

/// Failure reported by a repository implementation.
///
/// The resolver never retries or swallows these; they reach the caller as
/// [`EntrustError::Repository`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The backing store could not be reached (or a lock was poisoned).
    #[error("repository unavailable: {0}")]
    Unavailable(String),

    /// A referenced principal, role or permission does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated (e.g. duplicate role name).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

/// Failure reported by a cache backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache backend failure: {0}")]
    Backend(String),

    #[error("cache serialization failure: {0}")]
    Serialization(String),
}

/// Top-level error for decision calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntrustError {
    /// The caller passed options that cannot be honoured. Fix the call; do not retry.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl EntrustError {
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}
