//! Error types for the pipeline client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the pipeline API
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connection, timeout, body read)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Create or update answered with something other than its success status
    #[error("{operation} pipeline failed with status {status}: {body}")]
    RemoteRejected {
        /// `Creating` or `Updating`
        operation: &'static str,
        /// HTTP status code
        status: u16,
        /// Response body, compact JSON when it parsed, raw text otherwise
        body: String,
    },

    /// The existence check failed with a status other than 404
    #[error("Fetching pipeline failed with status {status}: {body}")]
    RemoteUnexpected {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}
