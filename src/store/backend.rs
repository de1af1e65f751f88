//! Backend trait for the KV store.
//!
//! Defines the interface that all KV storage backends must implement,
//! enabling pluggable storage (redb, memory, or an external server).

use async_trait::async_trait;

use super::error::Result;
use super::ops::{Commit, ScanPage, StoreOp};

/// Backend trait for key-value storage with string-keyed sets.
///
/// All backends must be thread-safe (`Send + Sync`) for use with tokio.
/// Single-key operations are atomic on their own; multi-step effects go
/// through [`atomic`](KvBackend::atomic), which applies every step or none.
///
/// # Example
///
/// ```ignore
/// use order_api::store::{KvBackend, MemoryBackend};
///
/// let backend = MemoryBackend::new();
/// assert!(backend.set_if_absent("key", b"value".to_vec()).await?);
/// let value = backend.get("key").await?;
/// ```
#[async_trait]
pub trait KvBackend: Send + Sync + 'static {
    /// Retrieves a value by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores a value, overwriting any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Stores a value only if the key is absent.
    ///
    /// Returns `Ok(true)` if the value was written, `Ok(false)` if the key
    /// already existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn set_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool>;

    /// Stores a value only if the key is present.
    ///
    /// Returns `Ok(true)` if the value was written, `Ok(false)` if the key
    /// did not exist. Never creates a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn set_if_present(&self, key: &str, value: Vec<u8>) -> Result<bool>;

    /// Deletes a key.
    ///
    /// Returns `Ok(true)` if the key existed and was removed,
    /// `Ok(false)` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Adds a member to a set, creating the set if needed.
    ///
    /// Returns `Ok(true)` if the member was newly added.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn add_to_set(&self, set: &str, member: &str) -> Result<bool>;

    /// Removes a member from a set.
    ///
    /// Returns `Ok(true)` if the member was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn remove_from_set(&self, set: &str, member: &str) -> Result<bool>;

    /// Checks set membership.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn is_member(&self, set: &str, member: &str) -> Result<bool>;

    /// Incrementally scans a set.
    ///
    /// Starting at `cursor` (`0` for a fresh scan), examines up to `count`
    /// members and returns those matching the glob `pattern`, together with
    /// the cursor to resume from. A returned cursor of `0` means the set was
    /// fully traversed. The cursor is an opaque token: mutations between
    /// calls may cause members to be returned twice or skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid or the underlying storage
    /// operation fails.
    async fn scan_set(&self, set: &str, cursor: u64, pattern: &str, count: usize)
    -> Result<ScanPage>;

    /// Fetches several keys at once.
    ///
    /// The result has one entry per requested key, in the same order, with
    /// `None` for absent keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>>;

    /// Applies a group of operations atomically.
    ///
    /// Either every step is applied, or none is. A conditional step whose
    /// condition fails yields [`Commit::Discarded`]; a storage failure yields
    /// an error. In both cases nothing is applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn atomic(&self, ops: Vec<StoreOp>) -> Result<Commit>;

    /// Connectivity check.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve requests.
    async fn ping(&self) -> Result<()>;

    /// Releases the store connection.
    ///
    /// Idempotent. Operations issued after closing fail with
    /// [`StoreError::Closed`](super::StoreError::Closed).
    ///
    /// # Errors
    ///
    /// Returns an error if releasing the underlying resources fails.
    async fn close(&self) -> Result<()>;
}
