//! Redb-backed KV storage backend.
//!
//! Provides persistent key-value storage using redb with ACID guarantees.
//! Every atomic group runs inside a single redb write transaction, so a
//! rejected or failed group leaves the database untouched.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use redb::{Database, ReadableDatabase, ReadableTable, Table, TableDefinition};

use super::DEFAULT_SCAN_COUNT;
use super::backend::KvBackend;
use super::error::{Result, StoreError};
use super::ops::{Commit, MemberFilter, Rejection, ScanPage, StoreOp};

/// Table for plain values: key = store key, value = raw bytes
pub(crate) const VALUES_TABLE: TableDefinition<'static, &'static str, &'static [u8]> =
    TableDefinition::new("kv");

/// Table for set membership: key = (set name, member), value = empty (existence check)
pub(crate) const SETS_TABLE: TableDefinition<'static, (&'static str, &'static str), ()> =
    TableDefinition::new("kv_sets");

/// Redb-backed key-value storage backend.
///
/// Provides persistent storage with ACID guarantees. Suitable for
/// production use where durability is required.
///
/// # Thread Safety
///
/// `RedbBackend` is `Clone` and can be shared across threads. Clones share
/// the same database handle; closing one closes all of them.
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<RwLock<Option<Arc<Database>>>>,
}

impl RedbBackend {
    /// Opens or creates a redb database at the given path.
    ///
    /// Creates parent directories if needed and makes sure both tables exist
    /// so that read transactions never see a missing table.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory cannot be created
    /// - Database file cannot be opened or created (permissions, disk full, etc.)
    /// - Initialization transaction fails to begin or commit
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::io(
                    format!("creating store directory {}", parent.display()),
                    e,
                )
            })?;
        }

        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _values = write_txn.open_table(VALUES_TABLE)?;
            let _sets = write_txn.open_table(SETS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(RwLock::new(Some(Arc::new(db)))),
        })
    }

    fn database(&self) -> Result<Arc<Database>> {
        self.db.read().clone().ok_or(StoreError::Closed)
    }

    /// Runs a synchronous redb operation on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&RedbBackend) -> Result<T> + Send + 'static,
    {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || f(&backend)).await?
    }

    fn get_sync(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let db = self.database()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(VALUES_TABLE)?;
        Ok(table.get(key)?.map(|guard| guard.value().to_vec()))
    }

    fn multi_get_sync(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        let db = self.database()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(VALUES_TABLE)?;

        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(table.get(key.as_str())?.map(|guard| guard.value().to_vec()));
        }
        Ok(values)
    }

    fn is_member_sync(&self, set: &str, member: &str) -> Result<bool> {
        let db = self.database()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(SETS_TABLE)?;
        Ok(table.get((set, member))?.is_some())
    }

    fn scan_sync(
        &self,
        set: &str,
        cursor: u64,
        filter: &MemberFilter,
        count: usize,
    ) -> Result<ScanPage> {
        let db = self.database()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(SETS_TABLE)?;

        let start = usize::try_from(cursor).unwrap_or(usize::MAX);
        let mut position = 0usize;
        let mut examined = 0usize;
        let mut members = Vec::new();
        let mut has_more = false;

        for item in table.range((set, "")..)? {
            let (key, _) = item?;
            let (owner, member) = key.value();
            if owner != set {
                break;
            }
            if position < start {
                position += 1;
                continue;
            }
            if examined == count {
                has_more = true;
                break;
            }
            if filter.matches(member) {
                members.push(member.to_string());
            }
            examined += 1;
            position += 1;
        }

        let cursor = if has_more { position as u64 } else { 0 };
        Ok(ScanPage { members, cursor })
    }

    fn atomic_sync(&self, ops: &[StoreOp]) -> Result<Commit> {
        let db = self.database()?;
        let write_txn = db.begin_write()?;

        let outcome = {
            let mut values = write_txn.open_table(VALUES_TABLE)?;
            let mut sets = write_txn.open_table(SETS_TABLE)?;

            let mut outcome = Commit::Applied;
            for (step, op) in ops.iter().enumerate() {
                if let Some(rejection) = apply_op(&mut values, &mut sets, op)? {
                    outcome = Commit::Discarded { step, rejection };
                    break;
                }
            }
            outcome
        };

        if outcome.is_applied() {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }

        Ok(outcome)
    }

    fn set_member_sync(&self, set: &str, member: &str, present: bool) -> Result<bool> {
        let db = self.database()?;
        let write_txn = db.begin_write()?;
        let changed = {
            let mut sets = write_txn.open_table(SETS_TABLE)?;
            if present {
                sets.insert((set, member), ())?.is_none()
            } else {
                sets.remove((set, member))?.is_some()
            }
        };
        write_txn.commit()?;
        Ok(changed)
    }
}

/// Applies one step inside an open write transaction.
///
/// Returns `Some(rejection)` when a conditional step does not hold; the caller
/// must then abort the transaction.
fn apply_op(
    values: &mut Table<'_, &'static str, &'static [u8]>,
    sets: &mut Table<'_, (&'static str, &'static str), ()>,
    op: &StoreOp,
) -> Result<Option<Rejection>> {
    match op {
        StoreOp::Set { key, value } => {
            values.insert(key.as_str(), value.as_slice())?;
        },
        StoreOp::SetIfAbsent { key, value } => {
            let exists = values.get(key.as_str())?.is_some();
            if exists {
                return Ok(Some(Rejection::KeyExists(key.clone())));
            }
            values.insert(key.as_str(), value.as_slice())?;
        },
        StoreOp::SetIfPresent { key, value } => {
            let exists = values.get(key.as_str())?.is_some();
            if !exists {
                return Ok(Some(Rejection::KeyMissing(key.clone())));
            }
            values.insert(key.as_str(), value.as_slice())?;
        },
        StoreOp::Delete { key } => {
            let removed = values.remove(key.as_str())?.is_some();
            if !removed {
                return Ok(Some(Rejection::KeyMissing(key.clone())));
            }
        },
        StoreOp::AddToSet { set, member } => {
            sets.insert((set.as_str(), member.as_str()), ())?;
        },
        StoreOp::RemoveFromSet { set, member } => {
            sets.remove((set.as_str(), member.as_str()))?;
        },
    }
    Ok(None)
}

#[async_trait]
impl KvBackend for RedbBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let key = key.to_string();
        self.blocking(move |backend| backend.get_sync(&key)).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let op = StoreOp::Set {
            key: key.to_string(),
            value,
        };
        self.blocking(move |backend| backend.atomic_sync(&[op]))
            .await
            .map(|_| ())
    }

    async fn set_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        let op = StoreOp::set_if_absent(key, value);
        self.blocking(move |backend| backend.atomic_sync(&[op]))
            .await
            .map(|commit| commit.is_applied())
    }

    async fn set_if_present(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        let op = StoreOp::set_if_present(key, value);
        self.blocking(move |backend| backend.atomic_sync(&[op]))
            .await
            .map(|commit| commit.is_applied())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let op = StoreOp::delete(key);
        self.blocking(move |backend| backend.atomic_sync(&[op]))
            .await
            .map(|commit| commit.is_applied())
    }

    async fn add_to_set(&self, set: &str, member: &str) -> Result<bool> {
        let (set, member) = (set.to_string(), member.to_string());
        self.blocking(move |backend| backend.set_member_sync(&set, &member, true))
            .await
    }

    async fn remove_from_set(&self, set: &str, member: &str) -> Result<bool> {
        let (set, member) = (set.to_string(), member.to_string());
        self.blocking(move |backend| backend.set_member_sync(&set, &member, false))
            .await
    }

    async fn is_member(&self, set: &str, member: &str) -> Result<bool> {
        let (set, member) = (set.to_string(), member.to_string());
        self.blocking(move |backend| backend.is_member_sync(&set, &member))
            .await
    }

    async fn scan_set(
        &self,
        set: &str,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<ScanPage> {
        let filter = MemberFilter::compile(pattern)?;
        let count = if count == 0 { DEFAULT_SCAN_COUNT } else { count };
        let set = set.to_string();
        self.blocking(move |backend| backend.scan_sync(&set, cursor, &filter, count))
            .await
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        let keys = keys.to_vec();
        self.blocking(move |backend| backend.multi_get_sync(&keys))
            .await
    }

    async fn atomic(&self, ops: Vec<StoreOp>) -> Result<Commit> {
        self.blocking(move |backend| backend.atomic_sync(&ops)).await
    }

    async fn ping(&self) -> Result<()> {
        self.blocking(|backend| {
            let db = backend.database()?;
            let read_txn = db.begin_read()?;
            let _table = read_txn.open_table(VALUES_TABLE)?;
            Ok(())
        })
        .await
    }

    async fn close(&self) -> Result<()> {
        // Dropping the last handle releases the file lock; in-flight blocking
        // tasks keep their own clone until they finish.
        self.db.write().take();
        Ok(())
    }
}
