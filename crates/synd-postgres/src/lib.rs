#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

/// Tracing target for connection management.
pub const TRACING_TARGET_CONNECTION: &str = "synd_postgres::connection";

/// Tracing target for content queries.
pub const TRACING_TARGET_QUERY: &str = "synd_postgres::query";

mod client;
mod config;
mod error;
mod inquirer;
mod model;
pub mod schema;

pub use client::{PgClient, PooledConnection};
pub use config::PgConfig;
pub use error::{Error, Result};
pub use inquirer::PgInquirer;
pub use model::ContentRecord;
