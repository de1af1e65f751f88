//! HTTP API handlers.

pub mod health;
pub mod orders;

pub(crate) use health::{health, root};
pub(crate) use orders::{create_order, delete_order, get_order, list_orders, update_order};
