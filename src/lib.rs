//! Order service backed by a key-value store.
//!
//! - [`store`] - Key-value store abstraction with memory and redb backends
//! - [`repository`] - Order records and their listing index on top of the store
//! - [`order`] - Order domain model and status transitions
//! - [`http`] - axum router for the `/orders` API
//! - [`app`] - Lifecycle controller: probe, serve, graceful shutdown
//! - [`config`] / [`logging`] - Bootstrap

pub mod app;
pub mod commands;
pub mod config;
pub mod http;
pub mod logging;
pub mod order;
pub mod repository;
pub mod store;
