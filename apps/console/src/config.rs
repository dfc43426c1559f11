//! Runtime configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use hrdesk_api::{ApiClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use hrdesk_realtime::{TransportConfig, DEFAULT_GREETING, DEFAULT_RECONNECT_DELAY, DEFAULT_WS_URL};

const DEFAULT_CREDENTIALS_PATH: &str = "./data/credentials.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub ws_url: String,
    pub credentials_path: PathBuf,
    /// Signs the session in at start when set.
    pub token: Option<String>,
    pub request_timeout: Duration,
    pub reconnect_delay: Duration,
    pub greeting: String,
    /// Periodic re-pull of both feeds; disabled when `None`.
    pub refresh_interval: Option<Duration>,
}

impl Config {
    /// Reads configuration from environment variables
    ///
    /// - `HRDESK_API_URL`: REST API root (default: http://localhost:8000/api)
    /// - `HRDESK_WS_URL`: websocket endpoint (default: ws://localhost:8000/ws)
    /// - `HRDESK_CREDENTIALS_PATH`: token file (default: ./data/credentials.json)
    /// - `HRDESK_TOKEN`: bearer token to sign in with
    /// - `HRDESK_REQUEST_TIMEOUT_SECS`: REST timeout (default: 15)
    /// - `HRDESK_RECONNECT_DELAY_MS`: delay between reconnects (default: 2000)
    /// - `HRDESK_GREETING`: content of the handshake frame
    /// - `HRDESK_REFRESH_SECS`: periodic pull interval (default: off)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let request_timeout_secs = parse_number(&lookup, "HRDESK_REQUEST_TIMEOUT_SECS")
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let reconnect_delay = parse_number(&lookup, "HRDESK_RECONNECT_DELAY_MS")
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_RECONNECT_DELAY);
        let refresh_interval = parse_number(&lookup, "HRDESK_REFRESH_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            api_url: text("HRDESK_API_URL", DEFAULT_API_URL),
            ws_url: text("HRDESK_WS_URL", DEFAULT_WS_URL),
            credentials_path: PathBuf::from(text(
                "HRDESK_CREDENTIALS_PATH",
                DEFAULT_CREDENTIALS_PATH,
            )),
            token: lookup("HRDESK_TOKEN").filter(|t| !t.trim().is_empty()),
            request_timeout: Duration::from_secs(request_timeout_secs),
            reconnect_delay,
            greeting: text("HRDESK_GREETING", DEFAULT_GREETING),
            refresh_interval,
        }
    }

    pub fn api_client_config(&self) -> ApiClientConfig {
        ApiClientConfig::new(&self.api_url).with_timeout(self.request_timeout)
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig::new(&self.ws_url)
            .with_reconnect_delay(self.reconnect_delay)
            .with_greeting(&self.greeting)
    }
}

/// Parses a numeric setting. Invalid values fall back to the default.
fn parse_number(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}; using default", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.ws_url, DEFAULT_WS_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.reconnect_delay, Duration::from_millis(2000));
        assert_eq!(config.greeting, DEFAULT_GREETING);
        assert!(config.token.is_none());
        assert!(config.refresh_interval.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("HRDESK_API_URL", "https://hr.example.com/api"),
            ("HRDESK_TOKEN", "abc"),
            ("HRDESK_RECONNECT_DELAY_MS", "250"),
            ("HRDESK_REFRESH_SECS", "60"),
        ]);
        assert_eq!(config.api_url, "https://hr.example.com/api");
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
        assert_eq!(config.refresh_interval, Some(Duration::from_secs(60)));
        assert_eq!(
            config.transport_config().reconnect_delay,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let config = config_from(&[
            ("HRDESK_REQUEST_TIMEOUT_SECS", "soon"),
            ("HRDESK_REFRESH_SECS", "0"),
        ]);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert!(config.refresh_interval.is_none());
    }
}
