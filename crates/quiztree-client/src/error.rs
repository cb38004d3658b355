//! Client error types.
//!
//! These represent failures talking to a persistence or upload backend.
//! Callers get them wrapped in `anyhow::Error` and can downcast to decide
//! whether retrying makes sense.

use thiserror::Error;

/// Errors that can occur when talking to a backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend rejected our credentials.
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// The requested test does not exist.
    #[error("test not found: {0}")]
    NotFound(String),

    /// The backend returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// Reading or writing local storage failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl ClientError {
    /// Returns `true` if repeating the same request cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_) | ClientError::NotFound(_))
    }
}
