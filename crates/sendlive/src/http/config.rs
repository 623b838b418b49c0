//! Vendor request settings.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default bound on a single vendor request: 30 seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("sendlive/", env!("CARGO_PKG_VERSION"));

/// Settings shared by every vendor REST client of an adapter.
///
/// The request timeout bounds one HTTP exchange. Waiting for a long-running
/// operation is bounded separately by the provider options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct HttpConfig {
    /// Timeout for one vendor request, in seconds (0 uses the default)
    #[cfg_attr(
        feature = "config",
        arg(
            long = "request-timeout",
            env = "SENDLIVE_REQUEST_TIMEOUT",
            default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
        )
    )]
    #[serde(default = "default_request_timeout_secs", alias = "http_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for establishing a connection, in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "connect-timeout", env = "SENDLIVE_CONNECT_TIMEOUT")
    )]
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    /// User-Agent header sent to the vendor APIs
    #[cfg_attr(
        feature = "config",
        arg(long = "user-agent", env = "SENDLIVE_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: None,
            user_agent: None,
        }
    }
}

impl HttpConfig {
    /// Request timeout; zero falls back to [`DEFAULT_REQUEST_TIMEOUT_SECS`].
    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout_secs {
            0 => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Connect timeout, when one is set and non-zero.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// User agent to send, [`DEFAULT_USER_AGENT`] unless overridden.
    pub fn user_agent_or_default(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Bounds each vendor request by `timeout`.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    /// Bounds connection setup by `timeout`.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = Some(timeout.as_secs());
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), None);
        assert!(config.user_agent_or_default().starts_with("sendlive/"));
    }

    #[test]
    fn test_zero_timeouts_fall_back() {
        let config = HttpConfig::default()
            .with_request_timeout(Duration::ZERO)
            .with_connect_timeout(Duration::ZERO);

        assert_eq!(
            config.request_timeout(),
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
        assert_eq!(config.connect_timeout(), None);
    }

    #[test]
    fn test_deserialize_accepts_short_timeout_name() {
        let config: HttpConfig = serde_json::from_value(json!({
            "http_timeout": 5,
            "user_agent": "ingest-bot/2",
        }))
        .unwrap();

        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.user_agent_or_default(), "ingest-bot/2");

        let config: HttpConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, HttpConfig::default());
    }
}
