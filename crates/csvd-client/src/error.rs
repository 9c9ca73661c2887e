//! Error types for the client library.

use thiserror::Error;

use csvd_core::DecodeError;

/// Client error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got a response (connect, timeout, transport).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The named table has never been written.
    #[error("table '{name}' not found")]
    NotFound {
        /// Requested name.
        name: String,
    },

    /// The server rejected the request body or name.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The request body exceeded the server's limit.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Any other non-success status.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The server returned a body that is not a valid table.
    #[error("invalid table in response: {0}")]
    Decode(#[from] DecodeError),

    /// A table could not be encoded for upload.
    #[error("encoding failed: {0}")]
    Encode(String),

    /// The server answered with something unexpected.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Returns true for [`ClientError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    /// Returns the HTTP status the server answered with, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::NotFound { .. } => Some(404),
            ClientError::BadRequest(_) => Some(400),
            ClientError::PayloadTooLarge(_) => Some(413),
            ClientError::Server { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
