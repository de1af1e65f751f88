//! Order storage on top of the key-value store.
//!
//! [`OrderRepository`] is the only writer of order records and of the
//! `orders` index set. See [`keys`] for the key layout.

mod error;
pub mod keys;
mod order;


pub use error::{RepositoryError, Result};
pub use keys::{ORDER_INDEX, order_key, parse_order_id, parse_order_key};
pub use order::{FindAllPage, FindResult, OrderRepository};
