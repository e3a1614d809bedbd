//! Xtream Codes API Types
//!
//! Entities decoded from player_api.php responses. Servers are loose about
//! JSON types (ids arrive as numbers or strings, optional fields as `null`),
//! so every field decodes leniently.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::{Accessor, Attribute, Listable};

// ============================================================================
// Lenient field decoding
// ============================================================================

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("integer out of range: {}", n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected integer, got '{}'", s))),
        Some(other) => Err(de::Error::custom(format!("expected integer, got {}", other))),
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

// ============================================================================
// Streams
// ============================================================================

/// Live or VOD stream
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Stream {
    #[serde(rename = "stream_id", deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    /// Segment used in playback URLs ("live", "movie", ...)
    #[serde(deserialize_with = "lenient_string")]
    pub stream_type: String,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_string")]
    pub category_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub avc_level: String,
    #[serde(alias = "container_extension", deserialize_with = "lenient_string")]
    pub container: String,
    #[serde(deserialize_with = "lenient_string")]
    pub custom_sid: String,
    #[serde(deserialize_with = "lenient_string")]
    pub direct_source: String,

    // M3U attributes
    #[serde(deserialize_with = "lenient_string")]
    pub tvg_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub tvg_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub tvg_logo: String,
    #[serde(deserialize_with = "lenient_string")]
    pub group_title: String,
}

impl Stream {
    fn attr_id(&self) -> Attribute<'_> {
        Attribute::Number(self.id)
    }

    fn attr_name(&self) -> Attribute<'_> {
        Attribute::Text(&self.name)
    }

    fn attr_stream_type(&self) -> Attribute<'_> {
        Attribute::Text(&self.stream_type)
    }

    fn attr_category_id(&self) -> Attribute<'_> {
        Attribute::Text(&self.category_id)
    }

    fn attr_container(&self) -> Attribute<'_> {
        Attribute::Text(&self.container)
    }

    // Streams without M3U metadata stay matchable by name
    fn attr_group_title(&self) -> Attribute<'_> {
        Attribute::Text(non_empty_or(&self.group_title, &self.name))
    }

    fn attr_tvg_id(&self) -> Attribute<'_> {
        Attribute::Text(&self.tvg_id)
    }

    fn attr_tvg_name(&self) -> Attribute<'_> {
        Attribute::Text(non_empty_or(&self.tvg_name, &self.name))
    }

    fn attr_tvg_logo(&self) -> Attribute<'_> {
        Attribute::Text(&self.tvg_logo)
    }

    fn attr_group_title_stored(&self) -> Attribute<'_> {
        Attribute::Text(&self.group_title)
    }

    fn attr_tvg_name_stored(&self) -> Attribute<'_> {
        Attribute::Text(&self.tvg_name)
    }
}

impl Listable for Stream {
    fn lookup(key: &str) -> Option<Accessor<Self>> {
        let accessor: Accessor<Self> = match key {
            "stream_id" | "id" => Stream::attr_id,
            "name" => Stream::attr_name,
            "stream_type" | "type" => Stream::attr_stream_type,
            "category_id" => Stream::attr_category_id,
            "container" => Stream::attr_container,
            "group-title" => Stream::attr_group_title,
            "tvg-id" => Stream::attr_tvg_id,
            "tvg-name" => Stream::attr_tvg_name,
            "tvg-logo" => Stream::attr_tvg_logo,
            _ => return None,
        };
        Some(accessor)
    }

    fn sort_lookup(key: &str) -> Option<Accessor<Self>> {
        match key {
            "group-title" => Some(Stream::attr_group_title_stored),
            "tvg-name" => Some(Stream::attr_tvg_name_stored),
            _ => Self::lookup(key),
        }
    }

    fn display_name(&self) -> Attribute<'_> {
        self.attr_name()
    }

    /// `id|name|stream_type|type|category_id|avc_level|container|custom_sid|direct_source`
    fn raw_record(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.id,
            self.name,
            self.stream_type,
            self.kind,
            self.category_id,
            self.avc_level,
            self.container,
            self.custom_sid,
            self.direct_source
        )
    }
}

// ============================================================================
// Categories
// ============================================================================

/// Category for live, VOD, or series
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Category {
    #[serde(rename = "category_id", deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(rename = "category_name", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub parent_id: i64,
}

impl Category {
    fn attr_id(&self) -> Attribute<'_> {
        Attribute::Text(&self.id)
    }

    fn attr_name(&self) -> Attribute<'_> {
        Attribute::Text(&self.name)
    }

    fn attr_kind(&self) -> Attribute<'_> {
        Attribute::Text(&self.kind)
    }

    fn attr_parent_id(&self) -> Attribute<'_> {
        Attribute::Number(self.parent_id)
    }
}

impl Listable for Category {
    fn lookup(key: &str) -> Option<Accessor<Self>> {
        let accessor: Accessor<Self> = match key {
            "category_id" | "id" => Category::attr_id,
            "category_name" | "name" => Category::attr_name,
            "type" => Category::attr_kind,
            "parent_id" => Category::attr_parent_id,
            _ => return None,
        };
        Some(accessor)
    }

    fn display_name(&self) -> Attribute<'_> {
        self.attr_name()
    }

    /// `id|name|type|parent_id`
    fn raw_record(&self) -> String {
        format!("{}|{}|{}|{}", self.id, self.name, self.kind, self.parent_id)
    }
}

// ============================================================================
// EPG
// ============================================================================

/// Programme entry from get_short_epg / get_simple_data_table
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EpgEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub epg_id: String,
    /// Usually base64 encoded, see [`EpgEntry::decoded_title`]
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub lang: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(alias = "channel", deserialize_with = "lenient_string")]
    pub channel_id: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub start_timestamp: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub stop_timestamp: i64,
}

/// Decode base64 text, passing plain text through untouched
fn decode_maybe_base64(value: &str) -> String {
    STANDARD
        .decode(value.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| value.to_string())
}

/// Unix timestamp first, then the "YYYY-MM-DD HH:MM:SS" text form
fn parse_epg_time(timestamp: i64, text: &str) -> Option<DateTime<Utc>> {
    if timestamp > 0 {
        if let Some(time) = Utc.timestamp_opt(timestamp, 0).single() {
            return Some(time);
        }
    }
    NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

impl EpgEntry {
    pub fn decoded_title(&self) -> String {
        decode_maybe_base64(&self.title)
    }

    pub fn decoded_description(&self) -> String {
        decode_maybe_base64(&self.description)
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        parse_epg_time(self.start_timestamp, &self.start)
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        parse_epg_time(self.stop_timestamp, &self.end)
    }
}

/// EPG listings container
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EpgListings {
    #[serde(default)]
    pub epg_listings: Vec<EpgEntry>,
}
