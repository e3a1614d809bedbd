//! Xtream Codes Player API client
//!
//! Every call goes through one pipeline:
//!
//! - **Options**: a [`RequestOptions`] is built from modifier closures
//!   ([`with_filter`], [`with_sort`], ...).
//! - **Rate limiting**: the call waits on the client's shared token bucket.
//! - **Execution**: credentials are injected, one GET is issued, and the JSON
//!   body is decoded.
//! - **Post-processing**: listings are regex-filtered and stably sorted.
//!
//! Every wait honors a caller-supplied [`CancellationToken`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use xtream_api::{with_filter, with_sort, CancellationToken, Config, SortDirection, XtreamClient};
//!
//! let client = XtreamClient::new(Config::new("http://example.com:8080", "user", "pass"))?;
//! let ctx = CancellationToken::new();
//!
//! let news = client
//!     .categories()
//!     .live(&ctx, [with_filter("name", "News"), with_sort("name", SortDirection::Ascending)])
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod detector;
pub mod error;
pub mod filter;
pub mod models;
pub mod options;
pub mod rate_limit;
pub mod retry;
pub mod services;

// Re-exports for convenience
pub use client::XtreamClient;
pub use config::{Config, RateLimitPolicy};
pub use detector::extract_credentials;
pub use error::{Result, XtreamError};
pub use filter::{transform, Attribute, Listable};
pub use models::{Category, EpgEntry, EpgListings, Stream};
pub use options::{
    with_category_id, with_filter, with_filter_raw, with_limit, with_sort, RequestOption,
    RequestOptions, SortDirection,
};
pub use rate_limit::RateLimiter;
pub use retry::{with_retries, RetryPolicy};
pub use services::{CategoryService, EpgService, StreamService};
pub use tokio_util::sync::CancellationToken;
