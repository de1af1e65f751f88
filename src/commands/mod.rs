//! CLI command implementations for order-api.
//!
//! - [`serve`] - Run the HTTP service
//! - [`check_config`] - Validate configuration and exit

pub mod check_config;
pub mod serve;
