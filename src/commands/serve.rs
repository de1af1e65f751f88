//! Run the order service.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::{self, App};
use crate::config::{Config, StoreBackend};
use crate::logging;

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub store: Option<StoreBackend>,
    pub store_path: Option<PathBuf>,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(backend) = self.store {
            config.store.backend = backend;
        }
        if let Some(path) = self.store_path {
            config.store.path = path;
        }
    }
}

/// Load configuration, open the store, and serve until Ctrl+C or SIGTERM.
pub async fn execute(config_path: Option<PathBuf>, overrides: Overrides) -> Result<()> {
    let mut config = Config::load(config_path.as_deref())?;
    overrides.apply(&mut config);

    logging::init_tracing(&config.tracing)?;

    let validation = config.validate()?;
    for warning in &validation.warnings {
        warn!("{warning}");
    }

    let addr = config.server.socket_addr()?;
    let store = config.store.open()?;
    info!(
        backend = ?config.store.backend,
        path = %config.store.path.display(),
        "store opened"
    );

    let shutdown = app::cancel_on_signal(CancellationToken::new());
    App::new(store, addr)
        .with_shutdown_grace(config.server.shutdown_grace())
        .with_page_size(config.server.page_size)
        .start(shutdown)
        .await
        .context("Order service stopped with an error")
}
