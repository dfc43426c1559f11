//! Error types for the REST client.

use thiserror::Error;

/// Result type alias for API client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur while talking to the HR API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No response within the client timeout
    #[error("Request timed out")]
    Timeout,

    /// Non-success answer from the API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The API rejected the bearer token (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid request (bad base URL, unusable key, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or malformed token
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl ApiError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Maps a transport failure, keeping timeouts distinct.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

impl From<ApiError> for hrdesk_core::Error {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized | ApiError::Auth(_) => hrdesk_core::Error::Unauthorized,
            ApiError::Timeout => hrdesk_core::Error::Timeout,
            ApiError::Api { status, message } => hrdesk_core::Error::remote(status, message),
            ApiError::Http(e) => hrdesk_core::Error::Network(e.to_string()),
            ApiError::Json(e) => hrdesk_core::Error::Json(e),
            ApiError::InvalidRequest(message) => hrdesk_core::Error::invalid_record(message),
        }
    }
}
