//! Validate a configuration file without starting the service.

use anyhow::Result;
use std::path::PathBuf;

use crate::config::{Config, DEFAULT_CONFIG_FILE};

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;
    let validation = config.validate()?;

    let source = config_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

    if validation.has_warnings() {
        println!("Configuration warnings ({source}):");
        for warning in &validation.warnings {
            println!("  - {warning}");
        }
    }

    println!(
        "Configuration OK: listening on {}:{}, store backend {:?}",
        config.server.host, config.server.port, config.store.backend
    );
    Ok(())
}
