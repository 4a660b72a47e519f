//! The synd content exporter service binary.

mod config;
mod server;

use config::Cli;

/// Tracing target for startup and shutdown events.
pub const TRACING_TARGET_STARTUP: &str = "synd_cli::startup";

/// Tracing target for configuration logging.
pub const TRACING_TARGET_CONFIG: &str = "synd_cli::config";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::init();
    Cli::init_tracing();
    cli.validate()?;
    cli.log();

    let services = config::create_services(&cli).await?;

    let listener_task = services.incremental.as_ref().map(|incremental| {
        let listener = incremental.listener.clone();
        let consumer = incremental.consumer.clone();
        tokio::spawn(listener.start(consumer))
    });

    let app = synd_server::router(services.state);
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        event = "service_started",
        app_name = %cli.export.app_name,
        "Service started"
    );

    server::serve_http(app, &cli.server).await?;

    if let Some(incremental) = &services.incremental {
        incremental.listener.stop().await;
    }
    if let Some(task) = listener_task {
        let _ = task.await;
    }

    tracing::info!(target: TRACING_TARGET_STARTUP, "Gracefully shut down");
    Ok(())
}
