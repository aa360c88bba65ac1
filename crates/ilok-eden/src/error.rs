//! Eden Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, EdenError>;

/// Licensing API errors
///
/// Only transport-level failures surface as errors. A reachable server that
/// answers with a non-2xx status is still a successful exchange from the
/// client's point of view; callers inspect [`ApiResponse::httpcode`] instead.
///
/// [`ApiResponse::httpcode`]: crate::ApiResponse::httpcode
#[derive(Error, Debug)]
pub enum EdenError {
    /// Client misconfiguration (bad base URL, missing token)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request did not complete within the configured deadline
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Connection or protocol failure before a status line was read
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

impl EdenError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, EdenError::Timeout(_) | EdenError::Transport(_))
    }
}
