//! Key-value store with pluggable backends.
//!
//! Provides the storage primitives the order repository is built on: plain
//! keys, string-keyed sets with incremental scans, bulk reads, and atomic
//! groups of operations. Supports multiple backends:
//!
//! - **RedbBackend**: Persistent storage with ACID guarantees
//! - **MemoryBackend**: Fast, non-persistent storage (ideal for testing/embedding)
//!
//! # Example
//!
//! ```ignore
//! use order_api::store::KvStore;
//!
//! // In-memory (testing/embedding)
//! let store = KvStore::memory();
//! store.set("key", b"value").await?;
//!
//! // Persistent (production)
//! let store = KvStore::file("data/orders.redb")?;
//! store.ping().await?;
//! ```
//!
//! # Custom Backends
//!
//! Implement the `KvBackend` trait to use custom storage:
//!
//! ```ignore
//! use order_api::store::{KvBackend, KvStore};
//!
//! struct RemoteBackend { /* ... */ }
//! impl KvBackend for RemoteBackend { /* ... */ }
//!
//! let store = KvStore::custom(RemoteBackend::new());
//! ```

mod backend;
mod error;
mod memory;
mod ops;
mod redb;
#[allow(clippy::module_inception)]
mod store;

#[cfg(test)]
mod tests;

pub use backend::KvBackend;
pub use error::{Result, StoreError};
pub use memory::MemoryBackend;
pub use ops::{Commit, Rejection, ScanPage, StoreOp};
pub use self::redb::RedbBackend;
pub use store::KvStore;

/// Members examined per scan call when the caller passes a count of zero.
pub const DEFAULT_SCAN_COUNT: usize = 10;
