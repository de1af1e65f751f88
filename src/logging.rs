//! Tracing subscriber setup.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{LogFormat, TracingConfig};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `config.filter`.
///
/// # Errors
///
/// Returns an error if `config.filter` is not a valid filter directive or a
/// global subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .with_context(|| format!("Invalid tracing.filter: '{}'", config.filter))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    }
    .context("Failed to initialize tracing")
}
