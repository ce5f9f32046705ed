//! Error types for the router.

use thiserror::Error;

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;

/// Errors that can occur while routing a request.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Every backend in the pool is currently unhealthy.
    #[error("no healthy backends available")]
    NoHealthyBackends,

    /// Forwarding to the selected backend failed.
    #[error("forward to {backend} failed: {message}")]
    Forward {
        /// The backend the request was sent to.
        backend: String,
        /// Description of the failure.
        message: String,
    },
}
