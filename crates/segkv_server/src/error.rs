//! Error types for the server handlers.

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server handlers.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The underlying transport to the db service failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The db service answered with a status the caller cannot handle.
    #[error("unexpected status {status} from db service")]
    UnexpectedStatus {
        /// The received status code.
        status: u16,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ServerError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}
