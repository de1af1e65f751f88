//! Order persistence over a [`KvStore`].

use tracing::{debug, warn};

use super::error::{RepositoryError, Result};
use super::keys::{ORDER_INDEX, order_key, parse_order_key};
use crate::order::Order;
use crate::store::{Commit, KvStore, Rejection, StoreOp};

/// Pagination request for [`OrderRepository::find_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindAllPage {
    /// Cursor returned by the previous page, or `0` to start.
    pub offset: u64,
    /// Number of index entries to examine for this page.
    pub size: usize,
}

/// One page of orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindResult {
    pub orders: Vec<Order>,
    /// Cursor for the next page; `0` when there is nothing more to read.
    pub cursor: u64,
}

/// Stores orders as JSON records keyed by `order:<id>` and keeps every
/// stored key in the `orders` index set.
///
/// Insert and delete touch the record and the index in one atomic group, so
/// the index holds a key exactly when its record exists. The repository never
/// retries; store failures are returned with the operation and key attached.
#[derive(Clone)]
pub struct OrderRepository {
    store: KvStore,
}

impl OrderRepository {
    pub fn new(store: KvStore) -> Self {
        Self { store }
    }

    /// Stores a new order and indexes it.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::AlreadyExists`] if an order with the same id is
    /// stored; nothing is written in that case.
    pub async fn insert(&self, order: &Order) -> Result<()> {
        let key = order_key(order.order_id);
        let payload = encode(&key, order)?;

        let commit = self
            .store
            .atomic(vec![
                StoreOp::set_if_absent(key.as_str(), payload),
                StoreOp::add_to_set(ORDER_INDEX, key.as_str()),
            ])
            .await
            .map_err(|e| RepositoryError::store("insert", key.as_str(), e))?;

        check_commit(commit, &key)?;
        debug!(key = %key, "order inserted");
        Ok(())
    }

    /// Loads one order.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::NotFound`] if no record exists for `id`.
    pub async fn find_by_id(&self, id: u64) -> Result<Order> {
        let key = order_key(id);
        let payload = self
            .store
            .get(&key)
            .await
            .map_err(|e| RepositoryError::store("find_by_id", key.as_str(), e))?
            .ok_or_else(|| RepositoryError::not_found(key.as_str()))?;

        decode(&key, &payload)
    }

    /// Overwrites an existing order. Never creates one and leaves the index
    /// alone.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::NotFound`] if no record exists for the order's id.
    pub async fn update(&self, order: &Order) -> Result<()> {
        let key = order_key(order.order_id);
        let payload = encode(&key, order)?;

        let written = self
            .store
            .set_if_present(&key, &payload)
            .await
            .map_err(|e| RepositoryError::store("update", key.as_str(), e))?;

        if !written {
            return Err(RepositoryError::not_found(key));
        }
        debug!(key = %key, "order updated");
        Ok(())
    }

    /// Removes an order and its index entry.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::NotFound`] if no record exists for `id`; the index is
    /// left untouched in that case.
    pub async fn delete_by_id(&self, id: u64) -> Result<()> {
        let key = order_key(id);

        let commit = self
            .store
            .atomic(vec![
                StoreOp::delete(key.as_str()),
                StoreOp::remove_from_set(ORDER_INDEX, key.as_str()),
            ])
            .await
            .map_err(|e| RepositoryError::store("delete_by_id", key.as_str(), e))?;

        check_commit(commit, &key)?;
        debug!(key = %key, "order deleted");
        Ok(())
    }

    /// Reads one page of orders from the index.
    ///
    /// Feed the returned cursor back as `offset` to continue. Orders created or
    /// deleted between calls may be seen twice or, rarely, missed.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Encoding`] if a listed record cannot be decoded, or
    /// [`RepositoryError::Store`] if the scan or the bulk read fails.
    pub async fn find_all(&self, page: FindAllPage) -> Result<FindResult> {
        let scan = self
            .store
            .scan_set(ORDER_INDEX, page.offset, "*", page.size)
            .await
            .map_err(|e| RepositoryError::store("find_all", ORDER_INDEX, e))?;

        // An empty page ends the listing even if the scan has more to examine.
        if scan.members.is_empty() {
            return Ok(FindResult::default());
        }

        let payloads = self
            .store
            .multi_get(&scan.members)
            .await
            .map_err(|e| RepositoryError::store("find_all", ORDER_INDEX, e))?;

        let mut orders = Vec::with_capacity(payloads.len());
        for (key, payload) in scan.members.iter().zip(payloads) {
            match payload {
                Some(bytes) => orders.push(decode(key, &bytes)?),
                None => {
                    warn!(
                        key = %key,
                        order_id = ?parse_order_key(key),
                        "indexed order has no record, skipping"
                    );
                }
            }
        }

        Ok(FindResult {
            orders,
            cursor: scan.cursor,
        })
    }
}

fn encode(key: &str, order: &Order) -> Result<Vec<u8>> {
    serde_json::to_vec(order).map_err(|e| RepositoryError::encoding(key, e))
}

fn decode(key: &str, payload: &[u8]) -> Result<Order> {
    serde_json::from_slice(payload).map_err(|e| RepositoryError::encoding(key, e))
}

fn check_commit(commit: Commit, key: &str) -> Result<()> {
    match commit {
        Commit::Applied => Ok(()),
        Commit::Discarded {
            rejection: Rejection::KeyExists(_),
            ..
        } => Err(RepositoryError::already_exists(key)),
        Commit::Discarded {
            rejection: Rejection::KeyMissing(_),
            ..
        } => Err(RepositoryError::not_found(key)),
    }
}
