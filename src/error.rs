//! Error types for the Xtream API client

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, XtreamError>;

/// Every failure the client can surface to its caller.
///
/// Nothing is swallowed internally: rate limiting, transport, decoding and
/// filter compilation failures all come back through this type.
#[derive(Debug, Error)]
pub enum XtreamError {
    /// Missing or invalid construction-time configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The call was cancelled while waiting for a rate-limit token or the response
    #[error("request cancelled")]
    Cancelled,

    /// Network/connection level failure
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with a non-2xx status
    #[error("HTTP error: {status}")]
    Http { status: u16 },

    /// Response body did not match the expected shape
    #[error("decode error: {0}")]
    Decode(String),

    /// Filter pattern failed to compile
    #[error("invalid filter pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl XtreamError {
    /// True for network failures and non-success statuses.
    pub fn is_transport(&self) -> bool {
        matches!(self, XtreamError::Network(_) | XtreamError::Http { .. })
    }

    /// True when the call never completed because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, XtreamError::Cancelled)
    }

    /// Whether a fresh attempt has a reasonable chance of succeeding.
    ///
    /// Only network failures, throttling (429) and 5xx statuses qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            XtreamError::Network(_) => true,
            XtreamError::Http { status } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for XtreamError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return XtreamError::Http {
                status: status.as_u16(),
            };
        }
        if err.is_timeout() {
            XtreamError::Network(format!("timeout - server did not respond: {}", err))
        } else if err.is_connect() {
            XtreamError::Network(format!("connection failed - server unreachable: {}", err))
        } else {
            XtreamError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for XtreamError {
    fn from(err: serde_json::Error) -> Self {
        XtreamError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_grouping() {
        assert!(XtreamError::Network("reset".into()).is_transport());
        assert!(XtreamError::Http { status: 404 }.is_transport());
        assert!(!XtreamError::Cancelled.is_transport());
        assert!(!XtreamError::Decode("eof".into()).is_transport());
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(XtreamError::Http { status: 503 }.is_retryable());
        assert!(XtreamError::Http { status: 429 }.is_retryable());
        assert!(!XtreamError::Http { status: 404 }.is_retryable());
        assert!(!XtreamError::Cancelled.is_retryable());
        assert!(!XtreamError::Configuration("x".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(XtreamError::Http { status: 502 }.to_string(), "HTTP error: 502");
        assert_eq!(XtreamError::Cancelled.to_string(), "request cancelled");
    }
}
