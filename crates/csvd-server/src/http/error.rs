//! HTTP error mapping.

use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use csvd_core::{DecodeError, StoreError};

/// Errors returned by request handlers.
///
/// Every variant maps to one status code; none of them affect other
/// in-flight requests.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body is not a valid table.
    #[error("invalid table: {0}")]
    Decode(#[from] DecodeError),

    /// The store rejected or could not find the table.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request body exceeded the configured limit.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge {
        /// Limit in bytes.
        limit: usize,
    },

    /// The request body could not be read.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Converts a body extraction failure, given the configured limit.
    pub fn from_body_rejection(rejection: BytesRejection, limit: usize) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge { limit }
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }

    /// Returns the HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Decode(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(e) => match e {
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::InvalidName { .. } => StatusCode::BAD_REQUEST,
                StoreError::NameSpaceExhausted { .. }
                | StoreError::Io { .. }
                | StoreError::Corrupted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, format!("{}\n", self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Decode(DecodeError::Empty), StatusCode::BAD_REQUEST),
            (
                ApiError::Store(StoreError::NotFound {
                    name: "x".to_string(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Store(StoreError::InvalidName {
                    name: "a b".to_string(),
                    reason: "bad",
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Store(StoreError::NameSpaceExhausted { attempts: 64 }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::PayloadTooLarge { limit: 10 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                ApiError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{}", error);
        }
    }

    #[test]
    fn test_into_response_uses_status() {
        let response = ApiError::Decode(DecodeError::Empty).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_messages() {
        let err = ApiError::Store(StoreError::NotFound {
            name: "never-written".to_string(),
        });
        assert_eq!(err.to_string(), "table 'never-written' not found");

        let err = ApiError::Decode(DecodeError::Ragged {
            line: 3,
            expected: 3,
            found: 2,
        });
        assert_eq!(
            err.to_string(),
            "invalid table: line 3: expected 3 fields, found 2"
        );
    }
}
