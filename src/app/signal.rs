//! OS signal wiring for graceful shutdown.

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancel `token` on Ctrl+C, or on SIGTERM on unix.
///
/// Returns the token for chaining.
pub fn cancel_on_signal(token: CancellationToken) -> CancellationToken {
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = shutdown_signal() => trigger.cancel(),
            () = trigger.cancelled() => {},
        }
    });
    token
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
