//! Error types for outbound HTTP operations.

use reqwest::StatusCode;

/// Result type for client operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the outbound HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure: connect, timeout, protocol.
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The collaborator answered with a status outside its contract.
    #[error("{operation} failed with unexpected status code: {status}")]
    UnexpectedStatus { operation: &'static str, status: u16 },

    /// The store holds nothing under the requested identifier.
    #[error("content not found in store")]
    NotFound,

    /// Invalid client configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    pub fn unexpected_status(operation: &'static str, status: StatusCode) -> Self {
        Self::UnexpectedStatus {
            operation,
            status: status.as_u16(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Whether retrying the request could plausibly succeed: transport
    /// failures and server-side errors, never client-side rejections.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(err) => !err.is_builder() && !err.is_redirect(),
            Error::UnexpectedStatus { status, .. } => *status >= 500,
            Error::NotFound | Error::InvalidConfig { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        assert!(Error::unexpected_status("upload", StatusCode::SERVICE_UNAVAILABLE).is_retryable());
        assert!(Error::unexpected_status("upload", StatusCode::INTERNAL_SERVER_ERROR).is_retryable());
    }

    #[test]
    fn client_errors_are_terminal() {
        assert!(!Error::unexpected_status("upload", StatusCode::BAD_REQUEST).is_retryable());
        assert!(!Error::NotFound.is_retryable());
        assert!(!Error::invalid_config("empty url").is_retryable());
    }
}
