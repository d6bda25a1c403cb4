//! Timestamp parsing for record inputs.
//!
//! Two parsing modes with deliberately different failure behavior:
//!
//! - [`parse_iso_utc`] falls back to the current time, so a malformed date
//!   string never drops an article from a batch.
//! - [`parse_unix_seconds`] is strict and returns `None`, because the post
//!   creation path must skip records without a stable timestamp; a now()
//!   fallback would mint a fresh point on every rerun of the same batch.

use chrono::{DateTime, TimeZone, Utc};

/// Parse an ISO-8601 timestamp (with or without an explicit "Z") into UTC.
///
/// Missing or unparseable input falls back to the current UTC time.
#[must_use]
pub fn parse_iso_utc(value: Option<&str>) -> DateTime<Utc> {
    parse_iso_utc_opt(value).unwrap_or_else(Utc::now)
}

/// Parse an ISO-8601 timestamp into UTC, returning `None` on failure.
///
/// Used by the stance-update path, where the timestamp must echo the
/// original point exactly and a fallback would create a duplicate.
#[must_use]
pub fn parse_iso_utc_opt(value: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = value.map(str::trim).filter(|s| !s.is_empty())?;

    // RFC 3339 covers the "Z" and offset forms; a bare datetime with no
    // offset is treated as already-UTC, matching how upstream crawlers
    // emit publication dates.
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    None
}

/// Parse a Unix-epoch value in whole seconds into UTC.
///
/// Fractional parts are discarded so that repeated runs over the same input
/// produce bit-identical timestamps. Absent, non-numeric, or out-of-range
/// values return `None`; callers must skip such records.
#[must_use]
pub fn parse_unix_seconds(value: Option<&serde_json::Value>) -> Option<DateTime<Utc>> {
    let secs = match value? {
        serde_json::Value::Number(n) => {
            // Truncate floats (Reddit emits created_utc as a float).
            n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64))?
        }
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))?
        }
        _ => return None,
    };
    Utc.timestamp_opt(secs, 0).single()
}
