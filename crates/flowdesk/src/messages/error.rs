//! Messages client error types.

use thiserror::Error;

/// Result type for messages-service operations.
pub type MessagesResult<T> = Result<T, MessagesError>;

/// Errors that can occur talking to the messages service.
#[derive(Debug, Error)]
pub enum MessagesError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The service rejected the bearer token.
    #[error("unauthorized: bearer token rejected")]
    Unauthorized,

    /// No bearer token is available; sending is disabled.
    #[error("no bearer token available; sending is disabled")]
    MissingToken,

    /// The service returned a non-success status.
    #[error("messages service error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response body.
    #[error("failed to parse response: {0}")]
    ParseError(String),
}
