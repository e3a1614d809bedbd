//! Endpoint adapters
//!
//! Each service maps a logical listing to its player_api.php action, runs it
//! through the client's executor and post-processes the result.
//!
//! ```rust,ignore
//! let ctx = CancellationToken::new();
//! let sports = client
//!     .streams()
//!     .live(&ctx, [with_filter("group-title", "Sports"), with_sort("name", SortDirection::Ascending)])
//!     .await?;
//! ```

pub mod categories;
pub mod epg;
pub mod streams;

pub use categories::CategoryService;
pub use epg::EpgService;
pub use streams::StreamService;

use crate::error::Result;
use crate::filter::{transform, Listable};
use crate::options::RequestOptions;

/// Filter, sort, then apply the result limit. A limit of 0 means no limit.
fn finish<T: Listable>(items: Vec<T>, options: &RequestOptions) -> Result<Vec<T>> {
    let mut items = transform(items, options)?;
    if let Some(limit) = options.limit.filter(|l| *l > 0) {
        items.truncate(limit);
    }
    Ok(items)
}
