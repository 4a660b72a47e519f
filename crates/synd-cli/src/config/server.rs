//! Network binding and lifecycle configuration.

use std::time::Duration;

use clap::Args;

/// HTTP server binding and shutdown settings.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Interface to bind.
    #[arg(long = "host", env = "APP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long = "port", env = "APP_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Seconds granted to in-flight requests during shutdown.
    #[arg(
        long = "shutdown-timeout-secs",
        env = "SHUTDOWN_TIMEOUT_SECS",
        default_value_t = 10
    )]
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[inline]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.host.trim().is_empty() {
            anyhow::bail!("host must not be empty");
        }
        Ok(())
    }
}
