//! Per-request options
//!
//! Options are assembled by applying modifier closures, in order, to a
//! zero-valued [`RequestOptions`]. When two modifiers touch the same field
//! the later one wins. Nothing is validated here; a bad regex only fails
//! once the filter is applied.
//!
//! ```rust,ignore
//! let opts = RequestOptions::build([
//!     with_filter("name", "Sports.*"),
//!     with_sort("name", SortDirection::Descending),
//! ]);
//! ```

/// Sort polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Options for a single listing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub category_id: Option<String>,
    pub limit: Option<usize>,
    pub filter_pattern: Option<String>,
    pub filter_key: Option<String>,
    pub filter_raw: bool,
    pub sort_key: Option<String>,
    pub sort_direction: SortDirection,
}

/// A modifier applied to [`RequestOptions`] while it is being built
pub type RequestOption = Box<dyn FnOnce(&mut RequestOptions) + Send>;

impl RequestOptions {
    /// Apply modifiers in order over a default instance
    pub fn build<I>(modifiers: I) -> Self
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let mut options = Self::default();
        for modifier in modifiers {
            modifier(&mut options);
        }
        options
    }

    /// Pattern to filter with, if any (empty counts as none)
    pub fn active_filter(&self) -> Option<&str> {
        self.filter_pattern.as_deref().filter(|p| !p.is_empty())
    }

    /// Sort key, if any (empty counts as none)
    pub fn active_sort(&self) -> Option<&str> {
        self.sort_key.as_deref().filter(|k| !k.is_empty())
    }
}

/// Restrict the listing to one category (sent upstream as `category_id`)
pub fn with_category_id(category_id: impl Into<String>) -> RequestOption {
    let category_id = category_id.into();
    Box::new(move |opts| opts.category_id = Some(category_id))
}

/// Cap the number of returned entries
pub fn with_limit(limit: usize) -> RequestOption {
    Box::new(move |opts| opts.limit = Some(limit))
}

/// Keep entries whose `key` attribute matches `pattern`
pub fn with_filter(key: impl Into<String>, pattern: impl Into<String>) -> RequestOption {
    let key = key.into();
    let pattern = pattern.into();
    Box::new(move |opts| {
        opts.filter_key = Some(key);
        opts.filter_pattern = Some(pattern);
        opts.filter_raw = false;
    })
}

/// Keep entries whose full pipe-delimited record matches `pattern`
pub fn with_filter_raw(pattern: impl Into<String>) -> RequestOption {
    let pattern = pattern.into();
    Box::new(move |opts| {
        opts.filter_pattern = Some(pattern);
        opts.filter_raw = true;
    })
}

/// Stable sort on `key` in the given direction
pub fn with_sort(key: impl Into<String>, direction: SortDirection) -> RequestOption {
    let key = key.into();
    Box::new(move |opts| {
        opts.sort_key = Some(key);
        opts.sort_direction = direction;
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_empty_is_default() {
        let opts = RequestOptions::build(Vec::new());
        assert_eq!(opts, RequestOptions::default());
        assert!(opts.active_filter().is_none());
        assert!(opts.active_sort().is_none());
        assert_eq!(opts.sort_direction, SortDirection::Ascending);
    }

    #[test]
    fn test_build_applies_all_fields() {
        let opts = RequestOptions::build([
            with_category_id("12"),
            with_limit(5),
            with_filter("tvg-name", "^BBC"),
            with_sort("id", SortDirection::Descending),
        ]);

        assert_eq!(opts.category_id.as_deref(), Some("12"));
        assert_eq!(opts.limit, Some(5));
        assert_eq!(opts.filter_key.as_deref(), Some("tvg-name"));
        assert_eq!(opts.active_filter(), Some("^BBC"));
        assert!(!opts.filter_raw);
        assert_eq!(opts.active_sort(), Some("id"));
        assert_eq!(opts.sort_direction, SortDirection::Descending);
    }

    #[test]
    fn test_last_writer_wins() {
        let opts = RequestOptions::build([
            with_sort("name", SortDirection::Descending),
            with_limit(10),
            with_sort("id", SortDirection::Ascending),
            with_limit(3),
        ]);
        assert_eq!(opts.active_sort(), Some("id"));
        assert_eq!(opts.sort_direction, SortDirection::Ascending);
        assert_eq!(opts.limit, Some(3));

        let opts = RequestOptions::build([with_filter("name", "a"), with_filter_raw("b")]);
        assert_eq!(opts.active_filter(), Some("b"));
        assert!(opts.filter_raw);

        let opts = RequestOptions::build([with_filter_raw("b"), with_filter("name", "a")]);
        assert_eq!(opts.active_filter(), Some("a"));
        assert!(!opts.filter_raw);
    }

    #[test]
    fn test_invalid_pattern_accepted_at_build_time() {
        let opts = RequestOptions::build([with_filter("name", "(")]);
        assert_eq!(opts.active_filter(), Some("("));
    }

    #[test]
    fn test_empty_strings_are_inactive() {
        let opts = RequestOptions::build([with_filter("name", ""), with_sort("", SortDirection::Descending)]);
        assert!(opts.active_filter().is_none());
        assert!(opts.active_sort().is_none());
    }
}
