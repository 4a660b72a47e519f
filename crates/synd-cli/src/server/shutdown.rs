//! Graceful shutdown signal handling.

use std::time::Duration;

use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix;

use crate::TRACING_TARGET_STARTUP;

/// Resolves when a shutdown signal is received.
///
/// Listens for SIGTERM (Unix) and Ctrl+C (everywhere). The returned future
/// is handed to axum's graceful shutdown, which then stops accepting new
/// connections and grants in-flight requests the configured timeout.
pub async fn shutdown_signal(shutdown_timeout: Duration) {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        unix::signal(unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::warn!(
        target: TRACING_TARGET_STARTUP,
        timeout_ms = shutdown_timeout.as_millis(),
        "Shutdown signal received, server is terminating"
    );
}
