//! Service configuration.
//!
//! The complete configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── server: ServerConfig        # Host, port, shutdown
//! ├── export: ExportConfig        # Allow-lists, workers, throttle
//! ├── postgres: PgConfig          # Document store pool
//! ├── http: HttpClientConfig      # Enrichment, writer, policy endpoints
//! └── stream: StreamConfig        # NATS stream and listener tuning
//! ```
//!
//! Every option can be provided as a CLI argument or environment variable;
//! a `.env` file is loaded first when present. Use `--help` to see all
//! available options.

mod export;
mod provider;
mod server;

use anyhow::Context;
use clap::Parser;
pub use export::ExportConfig;
pub use provider::{IncrementalExport, Services, create_services};
pub use server::ServerConfig;
use synd_postgres::PgConfig;
use synd_reqwest::HttpClientConfig;
use synd_stream::StreamConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete service configuration.
#[derive(Debug, Parser)]
#[command(name = "synd")]
#[command(about = "Exports enriched newsroom content to the object store")]
#[command(version)]
pub struct Cli {
    /// Network binding and lifecycle.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// Export behavior: allow-lists, worker pool, throttle.
    #[clap(flatten)]
    pub export: ExportConfig,

    /// Document-store connection.
    #[clap(flatten)]
    pub postgres: PgConfig,

    /// Collaborator HTTP endpoints.
    #[clap(flatten)]
    pub http: HttpClientConfig,

    /// Publication-event stream.
    #[clap(flatten)]
    pub stream: StreamConfig,
}

impl Cli {
    /// Loads `.env` (if present) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.export
            .validate()
            .context("invalid export configuration")?;
        self.http
            .validate()
            .context("invalid collaborator endpoints")?;
        Ok(())
    }

    /// Logs configuration at startup (no credentials).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = std::process::id(),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            addr = %self.server.server_addr(),
            app_name = %self.export.app_name,
            inc_export_enabled = self.export.is_inc_export_enabled,
            workers = self.export.nr_of_concurrent_workers,
            throttle_ms = self.export.content_retrieval_throttle,
            allowed_content_types = ?self.export.allowed_content_types,
            "Export configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            database_url = %self.postgres.database_url_masked(),
            postgres_max_connections = self.postgres.postgres_max_connections,
            "Database configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_and_validate() {
        let cli = Cli::parse_from(["synd"]);
        cli.validate().unwrap();
        assert!(!cli.export.is_inc_export_enabled);
        assert_eq!(cli.server.port, 8080);
    }

    #[test]
    fn invalid_origin_regex_is_rejected() {
        let cli = Cli::parse_from(["synd", "--content-origin-allowlist", "("]);
        assert!(cli.validate().is_err());
    }
}
