//! Xtream Codes URL Detection
//!
//! Builds a client [`Config`] from an Xtream-style M3U playlist URL.

use tracing::debug;
use url::Url;

use crate::config::Config;

/// Extract Xtream credentials from an M3U URL
///
/// Supported URL patterns:
/// - `http://server:port/get.php?username=X&password=Y&...`
/// - `http://server:port/get.php?username=X&password=Y&type=m3u_plus&output=ts`
///
/// # Returns
/// - `Some(Config)` with default settings if the URL matches the Xtream pattern
/// - `None` if URL is not an Xtream M3U URL
pub fn extract_credentials(m3u_url: &str) -> Option<Config> {
    let parsed = match Url::parse(m3u_url) {
        Ok(url) => url,
        Err(e) => {
            debug!("Failed to parse URL: {}", e);
            return None;
        }
    };

    let path = parsed.path().to_lowercase();
    if !path.contains("/get.php") {
        debug!("URL path does not contain /get.php: {}", path);
        return None;
    }

    let mut username = None;
    let mut password = None;
    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "username" => username = Some(value.into_owned()),
            "password" => password = Some(value.into_owned()),
            _ => {}
        }
    }
    let (username, password) = (username?, password?);

    if username.is_empty() || password.is_empty() {
        debug!("Empty username or password in URL");
        return None;
    }

    // Reconstruct server base URL
    let host = parsed.host_str()?;
    let port_suffix = parsed
        .port()
        .map(|p| format!(":{}", p))
        .unwrap_or_default();
    let server = format!("{}://{}{}", parsed.scheme(), host, port_suffix);

    debug!(
        "Extracted Xtream credentials: server={}, username={}",
        server, username
    );

    Some(Config::new(&server, &username, &password))
}
