//! Error types for the document-store layer.

/// Result type for document-store operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the Postgres client and inquirer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection pool could not be built.
    #[error("building connection pool: {0}")]
    PoolBuild(String),

    /// No connection could be checked out of the pool.
    #[error("acquiring connection: {0}")]
    Checkout(String),

    /// A query failed.
    #[error("query failed: {0}")]
    Query(#[from] diesel::result::Error),
}

impl Error {
    pub fn pool_build(details: impl Into<String>) -> Self {
        Self::PoolBuild(details.into())
    }

    pub fn checkout(details: impl Into<String>) -> Self {
        Self::Checkout(details.into())
    }
}
