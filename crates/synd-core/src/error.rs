//! Error types shared across the exporter workspace.

/// Boxed error type used at capability seams.
///
/// The `Send + Sync` bounds allow errors to cross task boundaries, which is
/// required everywhere the exporter fans work out to workers.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for core coordination operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the coordination primitives.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The listener did not pick up the pause request in time.
    #[error("Lock initiation timed out")]
    LockInitiationTimedOut,

    /// The listener picked up the pause request but never acknowledged it.
    #[error("Stopping stream consumption timed out")]
    ConsumptionHaltTimedOut,
}
