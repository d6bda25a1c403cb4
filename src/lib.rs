//! mediaflux - time-series access layer for news articles and matched posts
//!
//! This library converts application-level records (news articles and the
//! social-media posts matched to them) into time-series points, writes them
//! idempotently to an InfluxDB-compatible store, and reads them back as
//! typed rows or stable-schema tables.
//!
//! # Modules
//!
//! - [`config`] - Layered store configuration (defaults, file, environment)
//! - [`error`] - Custom error types with rich context
//! - [`model`] - Typed records and the untyped-input conversion boundary
//! - [`mapper`] - Record-to-point builders and identity deduplication
//! - [`flux`] - Validated query parameters and Flux query templates
//! - [`resultset`] - Annotated-CSV query result decoding
//! - [`client`] - Blocking HTTP client for the backing store
//! - [`table`] - Stable-schema tabular output for analytics consumers

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod flux;
pub mod logging;
pub mod mapper;
pub mod model;
pub mod point;
pub mod resultset;
pub mod table;
pub mod time;

pub use client::InfluxClient;
pub use config::Config;
pub use error::{MediafluxError, Result};
pub use model::*;
pub use point::{FieldValue, Point};

/// Marker appended to clipped long-text fields (a single ellipsis, so a
/// clipped field is exactly one character over the limit).
pub const TRUNCATION_MARKER: &str = "…";

/// Normalize an identity value: trim whitespace, treat empty as absent.
///
/// Records whose identity normalizes to `None` are dropped by the mapping
/// layer rather than raising an error.
#[must_use]
pub fn clean_id(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Clip text to at most `max_chars` characters, appending a truncation
/// marker when anything was cut. Counted in characters, not bytes, so a
/// clip never lands inside a UTF-8 sequence.
#[must_use]
pub fn clip(text: &str, max_chars: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => {
            let mut out = String::with_capacity(byte_idx + TRUNCATION_MARKER.len());
            out.push_str(&text[..byte_idx]);
            out.push_str(TRUNCATION_MARKER);
            out
        }
    }
}
