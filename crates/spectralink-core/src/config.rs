//! Configuration for the SpectraLink client.

use std::env;
use std::time::Duration;

use crate::error::{ChatError, Result};

/// Default server address.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";

/// Default message poll cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Configuration for the SpectraLink client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the collaborator server.
    pub server_url: String,
    /// Interval between message polls for the active conversation.
    pub poll_interval: Duration,
    /// Interval between roster refreshes (None = refresh at session start only).
    pub directory_refresh_interval: Option<Duration>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            directory_refresh_interval: None,
            request_timeout: Duration::from_millis(10_000),
        }
    }
}

impl ClientConfig {
    /// Load configuration from `SPECTRALINK_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(ClientConfig {
            server_url: env::var("SPECTRALINK_SERVER").unwrap_or(defaults.server_url),
            poll_interval: millis_var("SPECTRALINK_POLL_MS")?.unwrap_or(defaults.poll_interval),
            directory_refresh_interval: millis_var("SPECTRALINK_DIRECTORY_REFRESH_MS")?,
            request_timeout: millis_var("SPECTRALINK_REQUEST_TIMEOUT_MS")?
                .unwrap_or(defaults.request_timeout),
        })
    }

    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_directory_refresh(mut self, interval: Duration) -> Self {
        self.directory_refresh_interval = Some(interval);
        self
    }
}

fn millis_var(name: &str) -> Result<Option<Duration>> {
    match env::var(name) {
        Ok(raw) => {
            let ms: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ChatError::Config(format!("Invalid {}: {}", name, raw)))?;
            if ms == 0 {
                return Err(ChatError::Config(format!("{} must be positive", name)));
            }
            Ok(Some(Duration::from_millis(ms)))
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.server_url, "http://localhost:3001");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.directory_refresh_interval, None);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::default()
            .with_server_url("http://chat.local:9000")
            .with_poll_interval(Duration::from_millis(250))
            .with_directory_refresh(Duration::from_secs(30));
        assert_eq!(config.server_url, "http://chat.local:9000");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.directory_refresh_interval, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_partial_override() {
        let config = ClientConfig {
            poll_interval: Duration::from_millis(500),
            ..Default::default()
        };
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
    }
}
