//! HTTP server with graceful shutdown.

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use super::shutdown_signal;
use crate::TRACING_TARGET_STARTUP;
use crate::config::ServerConfig;

/// Binds the configured address and serves `app` until a shutdown signal
/// arrives; in-flight requests get the configured grace period.
pub async fn serve_http(app: Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        addr = %addr,
        "HTTP server bound and ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.shutdown_timeout()))
        .await
        .context("serving HTTP")
}
