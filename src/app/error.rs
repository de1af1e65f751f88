//! Errors that end the service lifecycle.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::store::StoreError;

/// Why [`App::start`](super::App::start) returned an error.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The store did not answer the startup ping. The listener was never
    /// started.
    #[error("store connectivity check failed: {0}")]
    Connectivity(#[source] StoreError),

    /// The listener failed to bind or stopped serving on its own.
    #[error("listener failed: {0}")]
    Listener(#[source] io::Error),

    /// In-flight requests did not drain within the grace period. The listener
    /// task was aborted.
    #[error("shutdown did not complete within {grace:?}")]
    ShutdownTimeout { grace: Duration },

    #[error("listener task panicked: {0}")]
    ListenerPanicked(String),
}
