//! Store error types.

use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors reported by a [`KvBackend`](super::KvBackend).
///
/// These describe transport and engine failures only. Conditional writes that
/// do not apply (key already present, key missing) are reported through return
/// values, not errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("io error in {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A blocking store task panicked or was cancelled.
    #[error("store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The store handle has been closed.
    #[error("store connection is closed")]
    Closed,

    /// The store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid scan pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl StoreError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
