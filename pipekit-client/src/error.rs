//! Error types for the Pipekit client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the Pipekit client
///
/// Every variant is surfaced to the immediate caller. Calls are never retried.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A base URI or assembled URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A request path could not be built from its template
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// No usable authorization token for the call
    #[error("Authorization error: {0}")]
    Auth(String),

    /// Request body could not be encoded as JSON
    #[error("Failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The call context was cancelled while the request was in flight
    #[error("Request cancelled")]
    Cancelled,

    /// The call context deadline passed before the exchange completed
    #[error("Request deadline exceeded")]
    DeadlineExceeded,

    /// Response body was not valid JSON for the expected type
    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Raw response body, or the canonical reason when the body was empty
        message: String,
    },
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            Self::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Check if the call was aborted through its context
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_classification() {
        let not_found = ClientError::api_error(404, "missing");
        assert!(not_found.is_not_found());
        assert!(not_found.is_client_error());
        assert!(!not_found.is_server_error());
        assert_eq!(not_found.status(), Some(404));

        let unavailable = ClientError::api_error(503, "");
        assert!(unavailable.is_server_error());
        assert!(!unavailable.is_client_error());
    }

    #[test]
    fn test_error_display() {
        let error = ClientError::api_error(500, "boom");
        let display = error.to_string();
        assert!(display.contains("500"));
        assert!(display.contains("boom"));

        assert_eq!(ClientError::Cancelled.to_string(), "Request cancelled");
        assert!(ClientError::DeadlineExceeded.is_cancelled());
        assert_eq!(ClientError::Auth("x".into()).status(), None);
    }
}
