//! Error types for the real-time transport.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors raised by the websocket transport.
///
/// None of these stop the transport: connection errors lead to a reconnect,
/// frame errors drop the frame.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Handshake, read or write failure on the socket
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    /// Configured endpoint is not a valid URL
    #[error("Invalid real-time URL: {0}")]
    Url(#[from] url::ParseError),

    /// Frame is not valid JSON or does not match `{type, data}`
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame is JSON but its payload is unusable
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// `connect` was called without a token
    #[error("No credential to connect with")]
    MissingCredential,
}

impl From<tungstenite::Error> for TransportError {
    fn from(err: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}
