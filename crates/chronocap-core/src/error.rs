//! Error types for chronocap.

use thiserror::Error;

/// Result type alias using chronocap's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for chronocap operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Invalid input (failed validation on write)
    #[error("{0}")]
    InvalidInput(String),

    /// Unique constraint violated
    #[error("{0}")]
    Conflict(String),

    /// Authentication failed
    #[error("{0}")]
    Unauthorized(String),

    /// An upstream collaborator (identity provider) rejected the call.
    ///
    /// `status` is the HTTP status the upstream attached to the failure and
    /// is forwarded to the client unchanged.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// HTTP/network request to an upstream failed before a response arrived
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build an upstream failure carrying the upstream's HTTP status.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Error::Upstream {
            status,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
