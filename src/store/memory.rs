//! In-memory KV storage backend.
//!
//! Provides a fast, non-persistent key-value store. Ideal for testing,
//! development, and embedded use cases.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::DEFAULT_SCAN_COUNT;
use super::backend::KvBackend;
use super::error::{Result, StoreError};
use super::ops::{Commit, MemberFilter, Rejection, ScanPage, StoreOp};

/// Inverse of one applied step, used to roll back a rejected group.
enum Undo {
    Value {
        key: String,
        previous: Option<Vec<u8>>,
    },
    Member {
        set: String,
        member: String,
        was_present: bool,
    },
}

#[derive(Default)]
struct MemoryState {
    values: HashMap<String, Vec<u8>>,
    sets: HashMap<String, BTreeSet<String>>,
}

impl MemoryState {
    fn apply(&mut self, op: StoreOp) -> std::result::Result<Undo, Rejection> {
        match op {
            StoreOp::Set { key, value } => {
                let previous = self.values.insert(key.clone(), value);
                Ok(Undo::Value { key, previous })
            },
            StoreOp::SetIfAbsent { key, value } => {
                if self.values.contains_key(&key) {
                    return Err(Rejection::KeyExists(key));
                }
                self.values.insert(key.clone(), value);
                Ok(Undo::Value {
                    key,
                    previous: None,
                })
            },
            StoreOp::SetIfPresent { key, value } => match self.values.get_mut(&key) {
                Some(slot) => {
                    let previous = std::mem::replace(slot, value);
                    Ok(Undo::Value {
                        key,
                        previous: Some(previous),
                    })
                },
                None => Err(Rejection::KeyMissing(key)),
            },
            StoreOp::Delete { key } => match self.values.remove(&key) {
                Some(previous) => Ok(Undo::Value {
                    key,
                    previous: Some(previous),
                }),
                None => Err(Rejection::KeyMissing(key)),
            },
            StoreOp::AddToSet { set, member } => {
                let added = self
                    .sets
                    .entry(set.clone())
                    .or_default()
                    .insert(member.clone());
                Ok(Undo::Member {
                    set,
                    member,
                    was_present: !added,
                })
            },
            StoreOp::RemoveFromSet { set, member } => {
                let removed = self.remove_member(&set, &member);
                Ok(Undo::Member {
                    set,
                    member,
                    was_present: removed,
                })
            },
        }
    }

    fn revert(&mut self, undo: Undo) {
        match undo {
            Undo::Value {
                key,
                previous: Some(value),
            } => {
                self.values.insert(key, value);
            },
            Undo::Value {
                key,
                previous: None,
            } => {
                self.values.remove(&key);
            },
            Undo::Member {
                set,
                member,
                was_present: true,
            } => {
                self.sets.entry(set).or_default().insert(member);
            },
            Undo::Member {
                set,
                member,
                was_present: false,
            } => {
                self.remove_member(&set, &member);
            },
        }
    }

    fn remove_member(&mut self, set: &str, member: &str) -> bool {
        let Some(members) = self.sets.get_mut(set) else {
            return false;
        };
        let removed = members.remove(member);
        if members.is_empty() {
            self.sets.remove(set);
        }
        removed
    }
}

/// In-memory key-value storage backend.
///
/// Provides fast, concurrent access without persistence. All data is lost
/// when the process exits. Ideal for:
/// - Testing and development
/// - Embedded applications
///
/// # Thread Safety
///
/// `MemoryBackend` is `Clone`; clones share the same data. A single mutex
/// guards values and sets together so that an atomic group is applied (or
/// rolled back) before any other caller observes the state.
///
/// # Example
///
/// ```ignore
/// use order_api::store::MemoryBackend;
///
/// let backend = MemoryBackend::new();
/// backend.set("key", b"value".to_vec()).await?;
/// ```
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
    closed: Arc<AtomicBool>,
}

impl MemoryBackend {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of plain keys in the store.
    pub fn len(&self) -> usize {
        self.state.lock().values.len()
    }

    /// Returns true if the store holds no keys and no sets.
    pub fn is_empty(&self) -> bool {
        let state = self.state.lock();
        state.values.is_empty() && state.sets.is_empty()
    }

    /// Returns the number of members in a set.
    pub fn set_len(&self, set: &str) -> usize {
        self.state.lock().sets.get(set).map_or(0, BTreeSet::len)
    }

    /// Returns true once [`close`](KvBackend::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn apply_one(&self, op: StoreOp) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.state.lock().apply(op).is_ok())
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        Ok(self.state.lock().values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.apply_one(StoreOp::Set {
            key: key.to_string(),
            value,
        })?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        self.apply_one(StoreOp::set_if_absent(key, value))
    }

    async fn set_if_present(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        self.apply_one(StoreOp::set_if_present(key, value))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.apply_one(StoreOp::delete(key))
    }

    async fn add_to_set(&self, set: &str, member: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self
            .state
            .lock()
            .sets
            .entry(set.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn remove_from_set(&self, set: &str, member: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.state.lock().remove_member(set, member))
    }

    async fn is_member(&self, set: &str, member: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self
            .state
            .lock()
            .sets
            .get(set)
            .is_some_and(|members| members.contains(member)))
    }

    async fn scan_set(
        &self,
        set: &str,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<ScanPage> {
        self.ensure_open()?;
        let filter = MemberFilter::compile(pattern)?;
        let count = if count == 0 { DEFAULT_SCAN_COUNT } else { count };

        let state = self.state.lock();
        let Some(members) = state.sets.get(set) else {
            return Ok(ScanPage::default());
        };

        let start = usize::try_from(cursor).unwrap_or(usize::MAX);
        let end = start.saturating_add(count);
        let matched = members
            .iter()
            .skip(start)
            .take(count)
            .filter(|member| filter.matches(member))
            .cloned()
            .collect();

        let next = if end < members.len() { end as u64 } else { 0 };
        Ok(ScanPage {
            members: matched,
            cursor: next,
        })
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        self.ensure_open()?;
        let state = self.state.lock();
        Ok(keys.iter().map(|key| state.values.get(key).cloned()).collect())
    }

    async fn atomic(&self, ops: Vec<StoreOp>) -> Result<Commit> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        let mut undo_log = Vec::with_capacity(ops.len());

        for (step, op) in ops.into_iter().enumerate() {
            match state.apply(op) {
                Ok(undo) => undo_log.push(undo),
                Err(rejection) => {
                    while let Some(undo) = undo_log.pop() {
                        state.revert(undo);
                    }
                    return Ok(Commit::Discarded { step, rejection });
                },
            }
        }

        Ok(Commit::Applied)
    }

    async fn ping(&self) -> Result<()> {
        self.ensure_open()
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
