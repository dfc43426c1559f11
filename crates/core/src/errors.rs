//! Core error types for the HR Desk client.
//!
//! This module defines transport-agnostic error types. HTTP and websocket
//! failures are converted to these types by the `api` and `realtime` crates.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the sync layer.
///
/// No variant is fatal to the process: callers surface the message to the
/// user or retry later.
#[derive(Error, Debug)]
pub enum Error {
    /// The session has no valid credential (missing token or a 401 response).
    #[error("Session is not authenticated")]
    Unauthorized,

    /// The remote source answered with a non-success status.
    #[error("Remote request failed ({status}): {message}")]
    Remote { status: u16, message: String },

    /// The remote source could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote source did not answer within the client timeout.
    #[error("Request timed out")]
    Timeout,

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Credential store error: {0}")]
    Credential(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a remote error from status and message
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid record error
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord(message.into())
    }

    /// Message suitable for showing to the user as-is.
    ///
    /// Remote failures surface the server's `message` verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
