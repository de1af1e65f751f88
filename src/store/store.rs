//! High-level `KvStore` wrapper over backend implementations.
//!
//! Provides a convenient API that wraps any `KvBackend` implementation.

use std::path::Path;
use std::sync::Arc;

use super::backend::KvBackend;
use super::error::Result;
use super::memory::MemoryBackend;
use super::ops::{Commit, ScanPage, StoreOp};
use super::redb::RedbBackend;

/// High-level key-value store handle.
///
/// Wraps a `KvBackend` implementation and provides a consistent API
/// regardless of the underlying storage mechanism.
///
/// # Thread Safety
///
/// `KvStore` is `Clone` and can be shared across tasks. Every clone talks to
/// the same backend, so there is exactly one logical connection per store.
///
/// # Example
///
/// ```ignore
/// use order_api::store::{KvStore, StoreOp};
///
/// let store = KvStore::memory();
///
/// let commit = store
///     .atomic(vec![
///         StoreOp::set_if_absent("order:1", b"{}".to_vec()),
///         StoreOp::add_to_set("orders", "order:1"),
///     ])
///     .await?;
/// assert!(commit.is_applied());
/// ```
#[derive(Clone)]
pub struct KvStore {
    backend: Arc<dyn KvBackend>,
}

impl KvStore {
    /// Creates a new `KvStore` backed by a file-based redb database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let backend = RedbBackend::open(path)?;
        Ok(Self {
            backend: Arc::new(backend),
        })
    }

    /// Creates a new `KvStore` backed by an in-memory store.
    ///
    /// All data is lost when the process exits.
    pub fn memory() -> Self {
        Self {
            backend: Arc::new(MemoryBackend::new()),
        }
    }

    /// Creates a new `KvStore` with a custom backend.
    pub fn custom<B: KvBackend>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Retrieves a value by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.backend.get(key).await
    }

    /// Stores a value, overwriting any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.backend.set(key, value.to_vec()).await
    }

    /// Stores a value only if the key is absent. Returns `true` if written.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn set_if_absent(&self, key: &str, value: &[u8]) -> Result<bool> {
        self.backend.set_if_absent(key, value.to_vec()).await
    }

    /// Stores a value only if the key exists. Returns `true` if written.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn set_if_present(&self, key: &str, value: &[u8]) -> Result<bool> {
        self.backend.set_if_present(key, value.to_vec()).await
    }

    /// Deletes a key. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.backend.delete(key).await
    }

    /// Adds a member to a set. Returns `true` if newly added.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn add_to_set(&self, set: &str, member: &str) -> Result<bool> {
        self.backend.add_to_set(set, member).await
    }

    /// Removes a member from a set. Returns `true` if it was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn remove_from_set(&self, set: &str, member: &str) -> Result<bool> {
        self.backend.remove_from_set(set, member).await
    }

    /// Checks set membership.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn is_member(&self, set: &str, member: &str) -> Result<bool> {
        self.backend.is_member(set, member).await
    }

    /// Scans one page of a set. See [`KvBackend::scan_set`].
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid or the storage operation fails.
    pub async fn scan_set(
        &self,
        set: &str,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<ScanPage> {
        self.backend.scan_set(set, cursor, pattern, count).await
    }

    /// Fetches several keys at once, preserving order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        self.backend.multi_get(keys).await
    }

    /// Applies a group of operations atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails; the group
    /// is not applied in that case.
    pub async fn atomic(&self, ops: Vec<StoreOp>) -> Result<Commit> {
        self.backend.atomic(ops).await
    }

    /// Connectivity check.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve requests.
    pub async fn ping(&self) -> Result<()> {
        self.backend.ping().await
    }

    /// Releases the store connection for every clone of this handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to release its resources.
    pub async fn close(&self) -> Result<()> {
        self.backend.close().await
    }
}
