//! Data models for article and matched-post records.
//!
//! Input batches arrive as loosely-shaped JSON objects produced by the
//! upstream crawler and matcher. All dynamic-shape handling lives here, in
//! one `from_input` conversion per record kind: identity normalization,
//! defaulting, numeric coercion, and timestamp resolution. Records that
//! survive conversion are fully typed; records that do not are dropped
//! silently (filtered input, not an error).

use crate::time::{parse_iso_utc, parse_iso_utc_opt, parse_unix_seconds};
use crate::{clean_id, clip};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum stored length for post body text, in characters.
pub const SELFTEXT_MAX_CHARS: usize = 8000;

/// Raw article row as emitted by the crawler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleInput {
    pub usid: Option<String>,
    pub date: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "oewaCategory")]
    pub category: Option<String>,
}

/// A validated news article, ready to become a point.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleRecord {
    pub usid: String,
    pub category: String,
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
}

impl ArticleRecord {
    /// Validate and normalize a raw article row.
    ///
    /// Returns `None` when the row has no usable identity. A malformed or
    /// missing publication date falls back to the current time.
    #[must_use]
    pub fn from_input(input: &ArticleInput) -> Option<Self> {
        let usid = clean_id(input.usid.as_deref())?;
        Some(Self {
            usid,
            category: input
                .category
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or("unknown")
                .to_string(),
            title: input.title.clone().unwrap_or_default(),
            link: input.link.clone().unwrap_or_default(),
            published_at: parse_iso_utc(input.date.as_deref()),
        })
    }
}

/// Raw matched-post row as emitted by the matcher.
///
/// The matcher and the older save path use slightly different key names for
/// the same values; aliases absorb both shapes here so downstream code sees
/// one schema.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostInput {
    #[serde(alias = "article_usid")]
    pub usid: Option<String>,
    pub source: Option<String>,
    pub reddit_id: Option<String>,
    #[serde(alias = "title")]
    pub reddit_title: Option<String>,
    #[serde(alias = "permalink")]
    pub reddit_permalink: Option<String>,
    #[serde(alias = "url")]
    pub post_url: Option<String>,
    #[serde(alias = "selftext")]
    pub reddit_selftext: Option<String>,
    pub checked_word_count: Option<serde_json::Value>,
    pub group_matches_in_window: Option<serde_json::Value>,
    /// Unix seconds; may arrive as a float or a numeric string.
    pub created_utc: Option<serde_json::Value>,
    pub saved_at_utc: Option<String>,
    pub stance_label: Option<String>,
    pub stance_conf: Option<serde_json::Value>,
}

/// A validated matched post, ready to become a point.
#[derive(Debug, Clone, Serialize)]
pub struct PostRecord {
    pub usid: String,
    pub source: String,
    pub reddit_id: String,
    pub title: String,
    pub permalink: String,
    pub url: String,
    pub checked_word_count: i64,
    pub group_matches_in_window: i64,
    pub selftext: String,
    pub stance_label: Option<String>,
    pub stance_conf: f64,
    pub created_at: DateTime<Utc>,
}

impl PostRecord {
    /// Validate and normalize a raw matched-post row.
    ///
    /// Returns `None` when the identity pair (`usid`, `reddit_id`) is
    /// incomplete, or when a supplied `created_utc` cannot be parsed.
    ///
    /// Timestamp resolution: `created_utc` (strict whole seconds) when the
    /// key carries a value, else `saved_at_utc` with a now() fallback, else
    /// now(). The strict path keeps reruns of the same matcher batch from
    /// minting new points.
    #[must_use]
    pub fn from_input(input: &PostInput) -> Option<Self> {
        let usid = clean_id(input.usid.as_deref())?;
        let reddit_id = clean_id(input.reddit_id.as_deref())?;

        let created_at = if has_value(input.created_utc.as_ref()) {
            parse_unix_seconds(input.created_utc.as_ref())?
        } else {
            parse_iso_utc(input.saved_at_utc.as_deref())
        };

        Some(Self {
            usid,
            source: input.source.clone().unwrap_or_default(),
            reddit_id,
            title: input.reddit_title.clone().unwrap_or_default(),
            permalink: input.reddit_permalink.clone().unwrap_or_default(),
            url: input.post_url.clone().unwrap_or_default(),
            checked_word_count: coerce_int(input.checked_word_count.as_ref()),
            group_matches_in_window: coerce_int(input.group_matches_in_window.as_ref()),
            selftext: clip(
                input.reddit_selftext.as_deref().unwrap_or(""),
                SELFTEXT_MAX_CHARS,
            ),
            stance_label: input
                .stance_label
                .clone()
                .filter(|label| !label.is_empty()),
            stance_conf: coerce_float(input.stance_conf.as_ref()),
            created_at,
        })
    }
}

/// Raw stance-labeler output row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StanceInput {
    #[serde(alias = "article_usid")]
    pub usid: Option<String>,
    pub source: Option<String>,
    /// Timestamp of the original post point, echoed back from a read.
    #[serde(alias = "_time")]
    pub saved_at_utc: Option<String>,
    pub stance_label: Option<String>,
    pub stance_conf: Option<serde_json::Value>,
}

/// A validated stance update targeting an existing post point.
///
/// `at` must equal the original point's timestamp exactly, or the store
/// creates a sibling point instead of merging the stance fields.
#[derive(Debug, Clone, Serialize)]
pub struct StanceUpdate {
    pub usid: String,
    pub source: String,
    pub stance_label: String,
    pub stance_conf: f64,
    pub at: DateTime<Utc>,
}

impl StanceUpdate {
    /// Validate a stance row. Rows without a resolvable identity or an
    /// exactly-parseable timestamp are dropped; a now() fallback here
    /// would write a duplicate point instead of an update.
    #[must_use]
    pub fn from_input(input: &StanceInput) -> Option<Self> {
        let usid = clean_id(input.usid.as_deref())?;
        let at = parse_iso_utc_opt(input.saved_at_utc.as_deref())?;
        Some(Self {
            usid,
            source: input.source.clone().unwrap_or_default(),
            stance_label: input.stance_label.clone().unwrap_or_default(),
            stance_conf: coerce_float(input.stance_conf.as_ref()),
            at,
        })
    }
}

/// An article row read back from the store (pivoted query result).
#[derive(Debug, Clone, Serialize)]
pub struct ArticleRow {
    pub time: Option<DateTime<Utc>>,
    pub usid: String,
    pub title: String,
    pub link: String,
    pub category: String,
}

impl ArticleRow {
    /// Build from a pivoted result row; absent columns become defaults.
    #[must_use]
    pub fn from_row(row: &crate::resultset::Row) -> Self {
        Self {
            time: row
                .get("_time")
                .and_then(|s| parse_iso_utc_opt(Some(s.as_str()))),
            usid: row.get("usid").map(|s| s.trim().to_string()).unwrap_or_default(),
            title: row.get("title").cloned().unwrap_or_default(),
            link: row.get("link").cloned().unwrap_or_default(),
            category: row.get("category").cloned().unwrap_or_default(),
        }
    }
}

/// A post row read back from the store (pivoted query result).
#[derive(Debug, Clone, Serialize)]
pub struct PostRow {
    pub time: Option<DateTime<Utc>>,
    pub usid: String,
    pub source: String,
    pub reddit_id: String,
    pub title: String,
    pub selftext: String,
    pub stance_label: String,
    pub stance_conf: f64,
}

impl PostRow {
    /// Build from a pivoted result row; absent columns become ""/0.0 so the
    /// schema stays stable regardless of which fields the window contained.
    #[must_use]
    pub fn from_row(row: &crate::resultset::Row) -> Self {
        Self {
            time: row
                .get("_time")
                .and_then(|s| parse_iso_utc_opt(Some(s.as_str()))),
            usid: row.get("usid").map(|s| s.trim().to_string()).unwrap_or_default(),
            source: row.get("source").cloned().unwrap_or_default(),
            reddit_id: row.get("reddit_id").cloned().unwrap_or_default(),
            title: row.get("title").cloned().unwrap_or_default(),
            selftext: row.get("selftext").cloned().unwrap_or_default(),
            stance_label: row.get("stance_label").cloned().unwrap_or_default(),
            stance_conf: row
                .get("stance_conf")
                .and_then(|s| s.parse::<f64>().ok())
                .unwrap_or(0.0),
        }
    }
}

fn has_value(value: Option<&serde_json::Value>) -> bool {
    value.is_some_and(|v| !v.is_null())
}

fn coerce_int(value: Option<&serde_json::Value>) -> i64 {
    match value {
        Some(serde_json::Value::Number(n)) => {
            n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)).unwrap_or(0)
        }
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn coerce_float(value: Option<&serde_json::Value>) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
