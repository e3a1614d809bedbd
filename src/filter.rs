//! Regex filtering and stable sorting of listing results
//!
//! The engine is written once and driven by each entity's attribute table
//! ([`Listable`]). Filtering runs first, then sorting:
//!
//! - **Keyed filter**: the filter key (case-insensitive) picks one attribute;
//!   unknown keys fall back to the display name.
//! - **Raw filter**: the pattern is tested against the entity's pipe-delimited
//!   record instead of a single attribute.
//! - **Sort**: stable, so equal entries keep their input order in both
//!   directions. Descending only flips the comparison. Sorting compares the
//!   stored field, so empty `tvg-name`/`group-title` values sort first
//!   instead of borrowing the name.
//!
//! Patterns are unanchored: a match anywhere in the value keeps the entry.

use std::borrow::Cow;
use std::cmp::Ordering;

use regex::Regex;
use tracing::debug;

use crate::error::{Result, XtreamError};
use crate::options::{RequestOptions, SortDirection};

/// Attribute value used for matching and ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Attribute<'a> {
    Number(i64),
    Text(&'a str),
}

impl<'a> Attribute<'a> {
    /// String form used by regex matching
    pub fn as_text(&self) -> Cow<'a, str> {
        match *self {
            Attribute::Number(n) => Cow::Owned(n.to_string()),
            Attribute::Text(s) => Cow::Borrowed(s),
        }
    }
}

/// Reads one attribute off an entity
pub type Accessor<T> = for<'a> fn(&'a T) -> Attribute<'a>;

/// An entity that can be filtered and sorted by named attributes
pub trait Listable: Sized {
    /// Resolve an already-lowercased key to its accessor
    fn lookup(key: &str) -> Option<Accessor<Self>>;

    /// Resolve an already-lowercased sort key. Defaults to [`Listable::lookup`].
    fn sort_lookup(key: &str) -> Option<Accessor<Self>> {
        Self::lookup(key)
    }

    /// Attribute used for unknown keys
    fn display_name(&self) -> Attribute<'_>;

    /// Every attribute, pipe-delimited in a fixed order, for raw filtering
    fn raw_record(&self) -> String;
}

/// Resolve a user-supplied key, falling back to the display name
pub fn resolve_key<T: Listable>(key: &str) -> Accessor<T> {
    T::lookup(&key.to_lowercase()).unwrap_or(T::display_name)
}

/// Resolve a sort key, falling back to the display name for unknown keys
pub fn resolve_sort_key<T: Listable>(key: &str) -> Accessor<T> {
    T::sort_lookup(&key.to_lowercase()).unwrap_or(T::display_name)
}

/// Filter then sort `items` according to `options`.
///
/// An invalid pattern fails the whole call before anything is filtered or
/// sorted; the unfiltered input is never handed back in its place.
pub fn transform<T: Listable>(items: Vec<T>, options: &RequestOptions) -> Result<Vec<T>> {
    let mut items = match options.active_filter() {
        Some(pattern) => filter(
            items,
            pattern,
            options.filter_key.as_deref(),
            options.filter_raw,
        )?,
        None => items,
    };

    if let Some(key) = options.active_sort() {
        sort(&mut items, key, options.sort_direction);
    }

    Ok(items)
}

/// Keep entries matching `pattern`, preserving their relative order.
///
/// `key` is ignored when `raw` is set; a missing key means the display name.
pub fn filter<T: Listable>(
    items: Vec<T>,
    pattern: &str,
    key: Option<&str>,
    raw: bool,
) -> Result<Vec<T>> {
    let regex = Regex::new(pattern).map_err(|e| XtreamError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let before = items.len();
    let kept: Vec<T> = if raw {
        items
            .into_iter()
            .filter(|item| regex.is_match(&item.raw_record()))
            .collect()
    } else {
        let accessor = resolve_key::<T>(key.unwrap_or_default());
        items
            .into_iter()
            .filter(|item| regex.is_match(&accessor(item).as_text()))
            .collect()
    };

    debug!(
        "Filter '{}' (raw: {}) kept {}/{} entries",
        pattern,
        raw,
        kept.len(),
        before
    );
    Ok(kept)
}

/// Stable in-place sort on the attribute named by `key`
pub fn sort<T: Listable>(items: &mut [T], key: &str, direction: SortDirection) {
    let accessor = resolve_sort_key::<T>(key);
    items.sort_by(|a, b| {
        let ordering: Ordering = accessor(a).cmp(&accessor(b));
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}
