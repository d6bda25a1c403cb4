//! Time-series point model and line-protocol encoding.
//!
//! A [`Point`] is one time-stamped record in the backing store, identified by
//! (measurement, tag set, timestamp). Fields are the mutable payload: writing
//! a second point with the same identity merges its fields into the existing
//! one (last write wins per field), which is what the stance-update path
//! relies on.
//!
//! Encoding follows the store's line protocol:
//! `measurement,tag=value field="value",n=1i 1700000000000000000`

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A field value carried by a point.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
}

/// One time-stamped record destined for the backing store.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    // BTreeMap keeps tags sorted by key, the canonical line-protocol order.
    tags: BTreeMap<String, String>,
    fields: Vec<(String, FieldValue)>,
    timestamp: DateTime<Utc>,
}

impl Point {
    /// Start a point for the given measurement, timestamped at `timestamp`.
    #[must_use]
    pub fn new(measurement: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.to_string(),
            tags: BTreeMap::new(),
            fields: Vec::new(),
            timestamp,
        }
    }

    /// Add an indexed identity/filter tag.
    ///
    /// Tags with an empty value are skipped; the store rejects them, and a
    /// missing tag is the consistent representation on both the create and
    /// update paths (identical tag sets are what make updates merge).
    #[must_use]
    pub fn tag(mut self, key: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.tags.insert(key.to_string(), value.to_string());
        }
        self
    }

    /// Add a string payload field.
    #[must_use]
    pub fn field_str(mut self, key: &str, value: &str) -> Self {
        self.fields
            .push((key.to_string(), FieldValue::Str(value.to_string())));
        self
    }

    /// Add an integer payload field.
    #[must_use]
    pub fn field_int(mut self, key: &str, value: i64) -> Self {
        self.fields.push((key.to_string(), FieldValue::Int(value)));
        self
    }

    /// Add a float payload field.
    #[must_use]
    pub fn field_float(mut self, key: &str, value: f64) -> Self {
        self.fields.push((key.to_string(), FieldValue::Float(value)));
        self
    }

    /// The point's timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The point's measurement name.
    #[must_use]
    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    /// Look up a tag value.
    #[must_use]
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Encode this point as one line of line protocol (no trailing newline).
    #[must_use]
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape_measurement(&self.measurement);

        for (key, value) in &self.tags {
            line.push(',');
            line.push_str(&escape_tag(key));
            line.push('=');
            line.push_str(&escape_tag(value));
        }

        line.push(' ');
        for (idx, (key, value)) in self.fields.iter().enumerate() {
            if idx > 0 {
                line.push(',');
            }
            line.push_str(&escape_tag(key));
            line.push('=');
            match value {
                FieldValue::Str(s) => {
                    line.push('"');
                    line.push_str(&escape_field_string(s));
                    line.push('"');
                }
                FieldValue::Int(n) => {
                    line.push_str(&n.to_string());
                    line.push('i');
                }
                FieldValue::Float(f) => line.push_str(&format_float(*f)),
            }
        }

        line.push(' ');
        line.push_str(
            &self
                .timestamp
                .timestamp_nanos_opt()
                .unwrap_or_else(|| self.timestamp.timestamp() * 1_000_000_000)
                .to_string(),
        );
        line
    }
}

/// Join a batch of points into a line-protocol request body.
#[must_use]
pub fn encode_batch(points: &[Point]) -> String {
    points
        .iter()
        .map(Point::to_line_protocol)
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_measurement(s: &str) -> String {
    escape_chars(s, &[',', ' '])
}

fn escape_tag(s: &str) -> String {
    escape_chars(s, &[',', '=', ' '])
}

fn escape_field_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_chars(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if special.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn format_float(f: f64) -> String {
    // `{}` prints integral floats without a decimal point; the store parses
    // a bare "1" in field position as a float anyway, but keep it explicit.
    if f.fract() == 0.0 && f.is_finite() {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}
