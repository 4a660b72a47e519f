#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

/// Tracing target for per-item export operations.
pub const TRACING_TARGET_EXPORT: &str = "synd_engine::export";

/// Tracing target for job lifecycle events.
pub const TRACING_TARGET_JOB: &str = "synd_engine::job";

mod error;
mod exporter;
mod job;
mod registry;

pub use error::{Error, Result, UpdaterError};
pub use exporter::{ContentFetcher, ContentUpdater, Exporter, Inquirer, Inquiry};
pub use job::{Job, JobSnapshot, JobStatus};
pub use registry::FullExporter;

/// Capacity of the stub channel between an inquirer and the worker pool.
pub const STUB_STREAM_CAPACITY: usize = 8;
