#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

/// Tracing target for outbound HTTP operations.
pub const TRACING_TARGET_HTTP: &str = "synd_reqwest::http";

/// User agent sent on every outbound request.
pub const USER_AGENT: &str = "Synd Content Exporter";

mod client;
mod config;
mod enriched;
mod error;
mod policy;
mod retry;
mod writer;

pub use client::HttpClients;
pub use config::HttpClientConfig;
pub use enriched::EnrichedContentFetcher;
pub use error::{Error, Result};
pub use policy::PolicyAgentClient;
pub use retry::RetryPolicy;
pub use writer::StoreWriter;
