//! Error types for the key-value client

use thiserror::Error;

/// Key-value client errors
#[derive(Debug, Error)]
pub enum KvError {
    /// The key does not exist
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// The service could not be reached
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with a non-success status
    #[error("unsuccessful response ({status}): {message}")]
    Unsuccessful {
        /// HTTP status code
        status: u16,
        /// Message reported by the service
        message: String,
    },

    /// The response body could not be understood
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The endpoint or key cannot form a request URL
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl KvError {
    /// Whether this error means the key is simply absent
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_))
    }
}

/// Result type for key-value operations
pub type Result<T> = std::result::Result<T, KvError>;

/// Handle RwLock poison errors consistently
pub(crate) fn handle_lock_poison<T>(e: std::sync::PoisonError<T>) -> KvError {
    KvError::Unavailable(format!("Lock poisoned: {}", e))
}
