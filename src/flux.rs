//! Flux query construction.
//!
//! Queries are built from templates plus validated arguments, never by
//! splicing untrusted text. A lookback must be a plain duration literal, a
//! limit a positive integer, a field name a bare identifier; string values
//! (usid lookups) are escaped as Flux string literals. Anything else is
//! rejected before a query string exists.

use crate::error::{MediafluxError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:s|m|h|d|w)$").unwrap());

static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// A validated relative time range for windowed reads ("30d", "1h").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookback(String);

impl Lookback {
    /// Validate a duration literal.
    pub fn new(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if DURATION_RE.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(MediafluxError::InvalidLookback {
                value: value.to_string(),
            })
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Lookback {
    type Err = MediafluxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated positive result limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(usize);

impl Limit {
    /// Validate a limit; zero or negative values are rejected.
    pub fn new(value: i64) -> Result<Self> {
        usize::try_from(value)
            .ok()
            .filter(|n| *n > 0)
            .map(Self)
            .ok_or(MediafluxError::InvalidLimit { value })
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A filter applied to the pivoted rows of a windowed read.
#[derive(Debug, Clone)]
pub enum FieldFilter {
    /// Keep rows where the named column is absent or the empty string.
    MissingOrEmpty(String),
    /// Keep rows where the named column is present and non-empty.
    Present(String),
}

impl FieldFilter {
    fn render(&self) -> Result<String> {
        let (field, clause) = match self {
            Self::MissingOrEmpty(field) => (
                field,
                format!("(not exists r.{field}) or r.{field} == \"\""),
            ),
            Self::Present(field) => {
                (field, format!("exists r.{field} and r.{field} != \"\""))
            }
        };
        ensure_identifier(field)?;
        Ok(format!("  |> filter(fn: (r) => {clause})\n"))
    }
}

/// Escape a value as a Flux double-quoted string literal (without quotes).
#[must_use]
pub fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// Build a windowed, pivoted, column-projected read over one measurement.
///
/// This is the single shape every row/table read in the crate uses: range
/// over the lookback, filter to the measurement, pivot per-field rows into
/// one row per timestamp, keep a whitelisted column projection, optionally
/// filter pivoted rows, sort newest-first, and cap the row count.
pub fn window_query(
    bucket: &str,
    measurement: &str,
    columns: &[&str],
    field_filter: Option<&FieldFilter>,
    lookback: &Lookback,
    limit: Option<Limit>,
) -> Result<String> {
    ensure_identifier(measurement)?;
    for column in columns {
        ensure_column(column)?;
    }

    let kept = columns
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(",");

    let mut query = format!(
        "from(bucket: \"{bucket}\")\n\
         \x20 |> range(start: -{lookback})\n\
         \x20 |> filter(fn: (r) => r._measurement == \"{measurement}\")\n\
         \x20 |> pivot(rowKey:[\"_time\"], columnKey: [\"_field\"], valueColumn: \"_value\")\n\
         \x20 |> keep(columns: [{kept}])\n",
        bucket = escape_string(bucket),
    );

    if let Some(filter) = field_filter {
        query.push_str(&filter.render()?);
    }
    query.push_str("  |> sort(columns: [\"_time\"], desc: true)\n");
    if let Some(limit) = limit {
        query.push_str(&format!("  |> limit(n: {limit})\n"));
    }
    Ok(query)
}

/// Build a distinct-values read for one field of one identity's points.
///
/// Used to fetch the `reddit_id` values already stored for a usid so a
/// rerun can skip posts that were written before.
pub fn distinct_field_query(
    bucket: &str,
    measurement: &str,
    usid: &str,
    field: &str,
    lookback: &Lookback,
) -> Result<String> {
    ensure_identifier(measurement)?;
    ensure_identifier(field)?;

    Ok(format!(
        "from(bucket: \"{bucket}\")\n\
         \x20 |> range(start: -{lookback})\n\
         \x20 |> filter(fn: (r) => r._measurement == \"{measurement}\")\n\
         \x20 |> filter(fn: (r) => r.usid == \"{usid}\")\n\
         \x20 |> filter(fn: (r) => r._field == \"{field}\")\n\
         \x20 |> keep(columns: [\"_value\"])\n\
         \x20 |> distinct(column: \"_value\")\n",
        bucket = escape_string(bucket),
        usid = escape_string(usid),
    ))
}

fn ensure_identifier(value: &str) -> Result<()> {
    if IDENT_RE.is_match(value) {
        Ok(())
    } else {
        Err(MediafluxError::InvalidFieldName {
            name: value.to_string(),
        })
    }
}

// Column projections may include the leading-underscore result columns.
fn ensure_column(value: &str) -> Result<()> {
    ensure_identifier(value.strip_prefix('_').unwrap_or(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_accepts_duration_literals() {
        for ok in ["30d", "1h", "45m", "10s", "2w", " 7d "] {
            assert!(Lookback::new(ok).is_ok(), "{ok} should be valid");
        }
    }

    #[test]
    fn lookback_rejects_injection_attempts() {
        for bad in ["", "30", "d30", "30d)", "30d\") |> drop()", "-30d", "30 d"] {
            assert!(Lookback::new(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn limit_rejects_non_positive() {
        assert!(Limit::new(0).is_err());
        assert!(Limit::new(-5).is_err());
        assert_eq!(Limit::new(500).unwrap().get(), 500);
    }

    #[test]
    fn escape_string_neutralizes_quotes() {
        assert_eq!(escape_string(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_string("line\nbreak"), "line\\nbreak");
    }

    #[test]
    fn window_query_contains_all_stages() {
        let q = window_query(
            "bigdata_bucket",
            "news_article",
            &["_time", "usid", "title"],
            None,
            &Lookback::new("1h").unwrap(),
            Some(Limit::new(100).unwrap()),
        )
        .unwrap();

        assert!(q.contains("from(bucket: \"bigdata_bucket\")"));
        assert!(q.contains("range(start: -1h)"));
        assert!(q.contains("r._measurement == \"news_article\""));
        assert!(q.contains("pivot(rowKey:[\"_time\"]"));
        assert!(q.contains("keep(columns: [\"_time\",\"usid\",\"title\"])"));
        assert!(q.contains("limit(n: 100)"));
    }

    #[test]
    fn window_query_renders_field_filters() {
        let lookback = Lookback::new("30d").unwrap();
        let q = window_query(
            "b",
            "reddit_post",
            &["_time", "stance_label"],
            Some(&FieldFilter::MissingOrEmpty("stance_label".into())),
            &lookback,
            None,
        )
        .unwrap();
        assert!(q.contains("(not exists r.stance_label) or r.stance_label == \"\""));

        let q = window_query(
            "b",
            "reddit_post",
            &["_time", "stance_label"],
            Some(&FieldFilter::Present("stance_label".into())),
            &lookback,
            None,
        )
        .unwrap();
        assert!(q.contains("exists r.stance_label and r.stance_label != \"\""));
    }

    #[test]
    fn field_filter_rejects_non_identifier_columns() {
        let filter = FieldFilter::Present("x) |> drop(".into());
        let result = window_query(
            "b",
            "reddit_post",
            &["_time"],
            Some(&filter),
            &Lookback::new("1h").unwrap(),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn distinct_query_escapes_usid() {
        let q = distinct_field_query(
            "b",
            "reddit_post",
            "12\"3",
            "reddit_id",
            &Lookback::new("365d").unwrap(),
        )
        .unwrap();
        assert!(q.contains("r.usid == \"12\\\"3\""));
        assert!(q.contains("distinct(column: \"_value\")"));
    }
}
