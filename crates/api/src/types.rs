//! Types for HR API requests and responses.

use hrdesk_core::records::Record;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API root.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Settings for [`crate::HrApiClient`].
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// API root, e.g. `https://hr.example.com/api`
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Envelope of listing responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub data: Vec<Record>,
}

/// Error payload returned by the API on failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
}
