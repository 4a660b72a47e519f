//! Error types for the publication-event pipeline.

/// Result type for stream operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while consuming and handling publication events.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// NATS connection failure.
    #[error("stream connection error: {0}")]
    Connection(#[from] async_nats::ConnectError),

    /// The stream or consumer could not be set up or read.
    #[error("stream consumer error: {0}")]
    Consumer(String),

    /// The delay before an UPDATE export was cut short by shutdown.
    #[error("delayed update terminated due to shutdown signal")]
    DelayInterrupted,

    /// The export of an UPDATE notification failed.
    #[error("UPDATE failed: {0}")]
    Update(#[source] synd_engine::Error),

    /// The deletion for a DELETE notification failed.
    #[error("DELETE failed: {0}")]
    Delete(#[source] synd_engine::Error),
}

impl Error {
    pub fn consumer(details: impl Into<String>) -> Self {
        Self::Consumer(details.into())
    }
}
