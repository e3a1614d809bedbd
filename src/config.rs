use std::env;
use std::time::Duration;

use crate::error::{Result, XtreamError};

/// Token bucket parameters: `rate` tokens per second, up to `burst` banked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitPolicy {
    pub rate: f64,
    pub burst: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            rate: 5.0,
            burst: 10,
        }
    }
}

impl RateLimitPolicy {
    /// No throttling at all.
    pub fn unlimited() -> Self {
        Self {
            rate: f64::INFINITY,
            burst: u32::MAX,
        }
    }
}

/// Client configuration
///
/// Immutable once handed to [`crate::XtreamClient::new`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Server base URL (e.g., "http://example.com:8080")
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
    /// Per-request HTTP timeout
    pub timeout: Duration,
    /// Carried for retry wrappers; the executor never retries on its own
    pub max_retries: u32,
    pub rate_limit: RateLimitPolicy,
    /// Skip TLS certificate verification (off by default). Credentials
    /// travel in the query string; only enable for panels you trust.
    pub accept_invalid_certs: bool,
}

impl Config {
    /// Build a config with defaults for everything but the credentials
    pub fn new(base_url: &str, username: &str, password: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let rate_defaults = RateLimitPolicy::default();

        Self {
            base_url: env::var("XTREAM_URL")
                .unwrap_or_default()
                .trim_end_matches('/')
                .to_string(),
            username: env::var("XTREAM_USERNAME").unwrap_or_default(),
            password: env::var("XTREAM_PASSWORD").unwrap_or_default(),
            user_agent: env::var("XTREAM_USER_AGENT").unwrap_or(defaults.user_agent),

            timeout: env::var("XTREAM_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),

            max_retries: env::var("XTREAM_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),

            rate_limit: RateLimitPolicy {
                rate: env::var("XTREAM_RATE_LIMIT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(rate_defaults.rate),
                burst: env::var("XTREAM_RATE_BURST")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(rate_defaults.burst),
            },

            accept_invalid_certs: env::var("XTREAM_ACCEPT_INVALID_CERTS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.accept_invalid_certs),
        }
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_rate_limit(mut self, rate: f64, burst: u32) -> Self {
        self.rate_limit = RateLimitPolicy { rate, burst };
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Username, password and base URL must all be present.
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(XtreamError::Configuration(
                "username and password are required".to_string(),
            ));
        }
        if self.base_url.is_empty() {
            return Err(XtreamError::Configuration(
                "base URL is required".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            user_agent: format!("xtream-api/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            rate_limit: RateLimitPolicy::default(),
            accept_invalid_certs: false,
        }
    }
}
