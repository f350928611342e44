//! Error types for backend communication

use thiserror::Error;

/// Result type for backend API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur while talking to the backend
///
/// The engine treats every variant the same way: log and degrade. None
/// of these are surfaced to the host application.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status
    #[error("HTTP error: status {0}")]
    Http(u16),

    /// The response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => ApiError::Http(code),
            ureq::Error::Transport(t) => ApiError::Network(t.to_string()),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
