//! Error types for adapters.

use thiserror::Error;

/// Errors that can occur when talking to the metrics backend or the
/// notification sink.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The peer answered with a non-success status.
    #[error("received code {status}; body: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// The configured address is not a valid URL.
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The address as configured.
        url: String,
        /// Why it could not be parsed.
        reason: String,
    },

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The backend understood the request but rejected the query.
    #[error("Query rejected by backend ({kind}): {message}")]
    Query {
        /// Backend error category, e.g. "bad_data".
        kind: String,
        /// Backend error message.
        message: String,
    },

    /// The operation was abandoned because shutdown was requested.
    #[error("Operation cancelled")]
    Cancelled,
}

impl AdapterError {
    /// Check if this error was caused by cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AdapterError::Cancelled)
    }

    /// Status code of a non-success response, if that is what failed.
    pub fn status(&self) -> Option<u16> {
        match self {
            AdapterError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Parse(err.to_string())
    }
}
