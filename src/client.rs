//! Xtream Codes API Client
//!
//! The request executor behind every endpoint: waits on the shared rate
//! limiter, injects credentials into the player_api.php query, issues exactly
//! one GET and decodes the body. It never retries; see [`crate::retry`] for an
//! opt-in wrapper driven by `max_retries`.

use std::sync::Arc;

use reqwest::header::USER_AGENT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use url::Url;

use crate::config::Config;
use crate::error::{Result, XtreamError};
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;

/// Longest body excerpt logged when decoding fails
const BODY_PREVIEW_CHARS: usize = 500;

/// Xtream API Client
///
/// Cheap to clone; clones share the HTTP connection pool and the rate limiter.
#[derive(Clone)]
pub struct XtreamClient {
    http: Client,
    config: Arc<Config>,
    api_endpoint: Url,
    limiter: Arc<RateLimiter>,
}

impl XtreamClient {
    /// Create a new Xtream client
    ///
    /// Fails with [`XtreamError::Configuration`] when the username, password or
    /// base URL is missing, or the base URL cannot be parsed.
    pub fn new(mut config: Config) -> Result<Self> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        config.validate()?;

        let api_endpoint = Url::parse(&format!("{}/player_api.php", config.base_url))
            .map_err(|e| {
                XtreamError::Configuration(format!("invalid base URL '{}': {}", config.base_url, e))
            })?;

        let http = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| XtreamError::Configuration(format!("failed to create HTTP client: {}", e)))?;

        let limiter = Arc::new(RateLimiter::new(config.rate_limit));

        Ok(Self {
            http,
            config: Arc::new(config),
            api_endpoint,
            limiter,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn username(&self) -> &str {
        &self.config.username
    }

    pub fn password(&self) -> &str {
        &self.config.password
    }

    /// Retry policy derived from the configured `max_retries`
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(&self.config)
    }

    /// Build the authenticated player_api.php URL for an action.
    ///
    /// Credentials and `action` always come first; an extra parameter with a
    /// name already present replaces the earlier value.
    pub fn request_url(&self, action: &str, params: &[(&str, String)]) -> Url {
        let mut pairs: Vec<(&str, &str)> = vec![
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
            ("action", action),
        ];
        for (key, value) in params {
            match pairs.iter_mut().find(|(k, _)| k == key) {
                Some(existing) => existing.1 = value.as_str(),
                None => pairs.push((*key, value.as_str())),
            }
        }

        let mut url = self.api_endpoint.clone();
        url.query_pairs_mut().extend_pairs(pairs);
        url
    }

    /// Playable media URL: `{base}/{segment}/{username}/{password}/{id}.{format}`
    pub fn stream_url(&self, stream_type: &str, stream_id: i64, format: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}.{}",
            self.config.base_url,
            stream_type,
            self.config.username,
            self.config.password,
            stream_id,
            format
        )
    }

    /// Run one player_api.php action and decode the JSON body into `T`.
    ///
    /// `ctx` is honored both while waiting for a rate-limit token and while
    /// the request is in flight.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        ctx: &CancellationToken,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        self.limiter.acquire(ctx).await?;

        let url = self.request_url(action, params);
        debug!("Xtream API request: {}", action);

        let body = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(XtreamError::Cancelled),
            result = self.fetch(url) => result?,
        };

        serde_json::from_slice(&body).map_err(|e| {
            error!(
                "Failed to parse Xtream response for action '{}': {}",
                action, e
            );
            let preview: String = String::from_utf8_lossy(&body)
                .chars()
                .take(BODY_PREVIEW_CHARS)
                .collect();
            debug!("Response text: {}", preview);
            XtreamError::Decode(e.to_string())
        })
    }

    /// Download the XMLTV export. No credentials are attached.
    pub async fn fetch_xmltv(&self, ctx: &CancellationToken) -> Result<Vec<u8>> {
        self.limiter.acquire(ctx).await?;

        let url = Url::parse(&format!("{}/xmltv.php", self.config.base_url))
            .map_err(|e| XtreamError::Configuration(e.to_string()))?;
        debug!("Xtream XMLTV request");

        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(XtreamError::Cancelled),
            result = self.fetch(url) => result,
        }
    }

    async fn fetch(&self, url: Url) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, self.config.user_agent.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(XtreamError::Http {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| XtreamError::Network(e.to_string()))?;
        Ok(body.to_vec())
    }
}

impl std::fmt::Debug for XtreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XtreamClient")
            .field("base_url", &self.config.base_url)
            .field("username", &self.config.username)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &str) -> XtreamClient {
        XtreamClient::new(Config::new(server, "user", "pass")).unwrap()
    }

    #[test]
    fn test_client_url_construction() {
        let url = client("http://example.com:8080").request_url("get_live_streams", &[]);
        assert_eq!(
            url.as_str(),
            "http://example.com:8080/player_api.php?username=user&password=pass&action=get_live_streams"
        );
    }

    #[test]
    fn test_client_url_trailing_slash() {
        let mut config = Config::new("http://example.com:8080", "user", "pass");
        config.base_url.push('/');
        let client = XtreamClient::new(config).unwrap();

        let url = client.request_url("get_vod_streams", &[]);
        assert!(!url.as_str().contains("//player_api"));
        assert_eq!(client.base_url(), "http://example.com:8080");
    }

    #[test]
    fn test_extra_params_are_merged_and_encoded() {
        let url = client("http://example.com").request_url(
            "get_live_streams",
            &[("category_id", "4 & 5".to_string()), ("limit", "3".to_string())],
        );
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(pairs[0], ("username".into(), "user".into()));
        assert_eq!(pairs[1], ("password".into(), "pass".into()));
        assert_eq!(pairs[2], ("action".into(), "get_live_streams".into()));
        assert_eq!(pairs[3], ("category_id".into(), "4 & 5".into()));
        assert_eq!(pairs[4], ("limit".into(), "3".into()));
    }

    #[test]
    fn test_colliding_param_is_last_write() {
        let url = client("http://example.com").request_url(
            "get_short_epg",
            &[("limit", "1".to_string()), ("limit", "2".to_string())],
        );
        let limits: Vec<String> = url
            .query_pairs()
            .filter(|(k, _)| k == "limit")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(limits, vec!["2"]);
    }

    #[test]
    fn test_stream_url() {
        let client = client("http://example.com:8080");
        assert_eq!(
            client.stream_url("live", 123, "ts"),
            "http://example.com:8080/live/user/pass/123.ts"
        );
        assert_eq!(
            client.stream_url("movie", 456, "mkv"),
            "http://example.com:8080/movie/user/pass/456.mkv"
        );
    }

    #[test]
    fn test_new_rejects_missing_credentials() {
        let err = XtreamClient::new(Config::new("http://example.com", "", "pass")).unwrap_err();
        assert!(matches!(err, XtreamError::Configuration(_)));

        let err = XtreamClient::new(Config::new("", "user", "pass")).unwrap_err();
        assert!(matches!(err, XtreamError::Configuration(_)));
    }

    #[test]
    fn test_new_rejects_unparsable_base_url() {
        let err = XtreamClient::new(Config::new("not a url", "user", "pass")).unwrap_err();
        assert!(matches!(err, XtreamError::Configuration(_)));
    }

    #[test]
    fn test_certificate_checks_on_by_default() {
        let client = client("https://example.com");
        assert!(!client.config().accept_invalid_certs);

        let client = XtreamClient::new(
            Config::new("https://example.com", "user", "pass").with_accept_invalid_certs(true),
        )
        .unwrap();
        assert!(client.config().accept_invalid_certs);
    }

    #[test]
    fn test_debug_hides_password() {
        let rendered = format!("{:?}", client("http://example.com"));
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("pass\""));
    }
}
