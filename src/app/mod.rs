//! Service lifecycle controller.
//!
//! [`App::start`] probes the store, serves the HTTP API on a spawned task, and
//! waits for either a listener failure or the shutdown token. Shutdown drains
//! in-flight requests for at most the configured grace period. The store is
//! closed last on every exit path.
//!
//! ```text
//! Initializing -> Probing -> Serving(addr) -> ShuttingDown -> Stopped
//!                    |            |
//!                    +------------+-----------------------> Stopped
//! ```

mod error;
mod signal;

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub use error::LifecycleError;
pub use signal::cancel_on_signal;

use crate::http::{self, AppState, DEFAULT_PAGE_SIZE};
use crate::store::KvStore;

/// Grace period for draining in-flight requests unless configured otherwise.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Observable lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Initializing,
    Probing,
    /// Listener bound to the given address.
    Serving(SocketAddr),
    ShuttingDown,
    Stopped,
}

impl LifecycleState {
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Bound address while serving.
    pub fn serving_addr(&self) -> Option<SocketAddr> {
        match self {
            Self::Serving(addr) => Some(*addr),
            _ => None,
        }
    }
}

/// The order service: one store, one listener.
pub struct App {
    store: KvStore,
    addr: SocketAddr,
    grace: Duration,
    page_size: usize,
    state: watch::Sender<LifecycleState>,
}

impl App {
    /// Creates a service that will listen on `addr` and own `store`.
    pub fn new(store: KvStore, addr: SocketAddr) -> Self {
        let (state, _) = watch::channel(LifecycleState::Initializing);
        Self {
            store,
            addr,
            grace: DEFAULT_SHUTDOWN_GRACE,
            page_size: DEFAULT_PAGE_SIZE,
            state,
        }
    }

    /// Sets the shutdown grace period.
    #[must_use]
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Sets the number of index entries read per `GET /orders` page.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Subscribes to lifecycle state changes.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Runs the service until `shutdown` is cancelled or the listener fails.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::Connectivity`] if the store does not answer the
    ///   startup ping; the listener is never started.
    /// - [`LifecycleError::Listener`] if binding or serving fails.
    /// - [`LifecycleError::ShutdownTimeout`] if draining overruns the grace
    ///   period.
    /// - [`LifecycleError::ListenerPanicked`] if the listener task panics.
    pub async fn start(self, shutdown: CancellationToken) -> Result<(), LifecycleError> {
        let result = self.run(&shutdown).await;

        if let Err(e) = self.store.close().await {
            warn!(error = %e, "failed to close store");
        }
        self.publish(LifecycleState::Stopped);

        match &result {
            Ok(()) => info!("service stopped"),
            Err(e) => error!(error = %e, "service stopped with error"),
        }
        result
    }

    async fn run(&self, shutdown: &CancellationToken) -> Result<(), LifecycleError> {
        self.publish(LifecycleState::Probing);
        self.store
            .ping()
            .await
            .map_err(LifecycleError::Connectivity)?;
        info!("store connectivity check passed");

        let bound = self.bind().await.map_err(LifecycleError::Listener)?;
        let local = bound.local_addr().map_err(LifecycleError::Listener)?;
        info!(addr = %local, "listening");
        self.publish(LifecycleState::Serving(local));

        let drain = CancellationToken::new();
        let (failed_tx, failed_rx) = oneshot::channel();
        let mut listener = self.spawn_listener(bound, drain.clone(), failed_tx);

        tokio::select! {
            failed = failed_rx => {
                return match failed {
                    Ok(err) => Err(LifecycleError::Listener(err)),
                    // Sender dropped without an error: the task ended cleanly
                    // or panicked.
                    Err(_) => join_outcome(listener.await),
                };
            }
            () = shutdown.cancelled() => {}
        }

        self.publish(LifecycleState::ShuttingDown);
        info!(grace = ?self.grace, "shutting down, draining in-flight requests");
        drain.cancel();

        match tokio::time::timeout(self.grace, &mut listener).await {
            Ok(joined) => join_outcome(joined),
            Err(_) => {
                listener.abort();
                Err(LifecycleError::ShutdownTimeout { grace: self.grace })
            },
        }
    }

    async fn bind(&self) -> io::Result<TcpListener> {
        TcpListener::bind(self.addr).await.inspect_err(|e| {
            error!(addr = %self.addr, error = %e, "failed to bind listener");
        })
    }

    /// Serves on a new task. A serve error is sent once on `failed`.
    fn spawn_listener(
        &self,
        listener: TcpListener,
        drain: CancellationToken,
        failed: oneshot::Sender<io::Error>,
    ) -> JoinHandle<()> {
        let router = http::router(AppState::new(self.store.clone(), self.page_size));

        tokio::spawn(async move {
            let outcome = axum::serve(listener, router)
                .with_graceful_shutdown(drain.cancelled_owned())
                .await;

            if let Err(e) = outcome {
                error!(error = %e, "listener failed");
                let _ = failed.send(e);
            }
        })
    }

    fn publish(&self, next: LifecycleState) {
        self.state.send_replace(next);
    }
}

fn join_outcome(joined: Result<(), tokio::task::JoinError>) -> Result<(), LifecycleError> {
    match joined {
        Ok(()) => Ok(()),
        Err(e) if e.is_panic() => Err(LifecycleError::ListenerPanicked(e.to_string())),
        Err(_) => Ok(()),
    }
}
