//! Export behavior configuration.

use std::time::Duration;

use anyhow::Context;
use clap::Args;
use regex::Regex;

/// Allow-lists, worker pool sizing and throttling for all export modes.
#[derive(Debug, Clone, Args)]
pub struct ExportConfig {
    /// Application name used in logs.
    #[arg(long = "app-name", env = "APP_NAME", default_value = "synd-content-exporter")]
    pub app_name: String,

    /// Origin allow-list for incoming publication events, as a regular
    /// expression matched against the content URI.
    #[arg(
        long = "content-origin-allowlist",
        env = "CONTENT_ORIGIN_ALLOWLIST",
        default_value = r"^http://.*-content-validator\.svc\.ft\.com(:\d{2,5})?/content/[\w-]+.*$"
    )]
    pub content_origin_allowlist: String,

    /// Exportable content types.
    #[arg(
        long = "allowed-content-types",
        env = "ALLOWED_CONTENT_TYPES",
        value_delimiter = ',',
        default_value = "Article"
    )]
    pub allowed_content_types: Vec<String>,

    /// Publication identifiers allowed for export; empty disables the check.
    #[arg(
        long = "allowed-publication-uuids",
        env = "ALLOWED_PUBLICATION_UUIDS",
        value_delimiter = ','
    )]
    pub allowed_publication_uuids: Vec<String>,

    /// Milliseconds between content retrieval calls within one worker.
    #[arg(
        long = "content-retrieval-throttle",
        env = "CONTENT_RETRIEVAL_THROTTLE",
        default_value_t = 0
    )]
    pub content_retrieval_throttle: u64,

    /// Worker pool size for full and targeted export jobs.
    #[arg(
        long = "nr-of-concurrent-workers",
        env = "NR_OF_CONCURRENT_WORKERS",
        default_value_t = 20
    )]
    pub nr_of_concurrent_workers: usize,

    /// Whether the incremental (stream-driven) export runs.
    #[arg(long = "is-inc-export-enabled", env = "IS_INC_EXPORT_ENABLED")]
    pub is_inc_export_enabled: bool,
}

impl ExportConfig {
    /// Compiles the origin allow-list.
    pub fn origin_allowlist(&self) -> anyhow::Result<Regex> {
        Regex::new(&self.content_origin_allowlist)
            .context("content-origin-allowlist is not a valid regular expression")
    }

    #[inline]
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.content_retrieval_throttle)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.origin_allowlist()?;
        if self.nr_of_concurrent_workers == 0 {
            anyhow::bail!("nr-of-concurrent-workers must be at least 1");
        }
        Ok(())
    }
}
