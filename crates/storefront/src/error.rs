//! Client error taxonomy.
//!
//! Fetch-layer errors are stored on cache entries and surfaced to
//! subscribers as data, so views can render degraded states. Mutation-layer
//! errors are returned to the caller after rollback, since the caller must
//! decide on user feedback.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced by the storefront client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the response not received.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("API error: HTTP {status}: {body}")]
    Api { status: StatusCode, body: String },

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The response body was not the JSON we expected.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Input rejected before any network call.
    #[error("validation error: {0}")]
    Validation(String),
}

impl ClientError {
    /// Build an API error from a status and raw body, truncating the body
    /// for display.
    #[must_use]
    pub fn api(status: StatusCode, body: &str) -> Self {
        Self::Api {
            status,
            body: body.chars().take(200).collect(),
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ClientError::NotFound("product 42".to_string());
        assert_eq!(err.to_string(), "not found: product 42");

        let err = ClientError::Validation("quantity must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "validation error: quantity must be at least 1"
        );
    }

    #[test]
    fn test_api_error_truncates_body() {
        let body = "x".repeat(500);
        let err = ClientError::api(StatusCode::BAD_GATEWAY, &body);
        let ClientError::Api { status, body } = err else {
            panic!("expected Api variant");
        };
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.len(), 200);
    }
}
