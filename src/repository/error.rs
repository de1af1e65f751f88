//! Error types for the order repository.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Errors returned by [`OrderRepository`](super::OrderRepository).
///
/// Every variant names the key it concerns; store failures also name the
/// operation that was running.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("order already exists: {key}")]
    AlreadyExists { key: String },

    #[error("order not found: {key}")]
    NotFound { key: String },

    #[error("failed to encode or decode {key}: {source}")]
    Encoding {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store failure during {op} on {key}: {source}")]
    Store {
        op: &'static str,
        key: String,
        #[source]
        source: StoreError,
    },
}

impl RepositoryError {
    /// Create an already-exists error.
    pub fn already_exists(key: impl Into<String>) -> Self {
        Self::AlreadyExists { key: key.into() }
    }

    /// Create a not-found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create an encoding error.
    pub fn encoding(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Encoding {
            key: key.into(),
            source,
        }
    }

    /// Create a store failure error.
    pub fn store(op: &'static str, key: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            op,
            key: key.into(),
            source,
        }
    }

    /// Returns `true` for [`RepositoryError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for [`RepositoryError::AlreadyExists`].
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}
