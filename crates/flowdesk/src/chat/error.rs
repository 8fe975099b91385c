//! Chat client error types.

use thiserror::Error;

use crate::messages::MessagesError;

/// Result type for chat panel operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Errors surfaced to the chat widget's caller.
///
/// Transport drops and malformed frames never appear here; the connection
/// manager retries the former and drops the latter per-frame, surfacing both
/// only through the connection-status indicator.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Submitted text was empty after trimming.
    #[error("message text is empty")]
    EmptyMessage,

    /// The panel was stopped before the operation completed.
    #[error("chat panel is closed")]
    PanelClosed,

    /// The send request failed; the placeholder stays visible, flagged.
    #[error("send failed: {0}")]
    Send(#[from] MessagesError),
}
