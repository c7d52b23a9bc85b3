//! Client error types.
//!
//! Backend validation failures (stock, payment) must reach the operator
//! verbatim, so the status-mapped variants carry the backend's own
//! message text and display it without decoration.

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response decoded, but not into what the contract promises.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required or expired.
    #[error("Authentication required")]
    Unauthorized,

    /// Resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the request (validation, stock conflict,
    /// lifecycle state). Message is the backend's, verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Backend-side failure (5xx or unclassified).
    #[error("{0}")]
    Backend(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message_is_verbatim() {
        let err = ClientError::Rejected("Insufficient stock for 4796001".to_string());
        assert_eq!(err.to_string(), "Insufficient stock for 4796001");
    }
}
