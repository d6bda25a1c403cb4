//! Custom error types for mediaflux.
//!
//! Provides structured error handling with detailed context for better
//! diagnostics. Malformed individual records never surface here; they are
//! dropped at the mapping boundary so one bad row cannot abort a batch.

use thiserror::Error;

/// Primary error type for mediaflux operations.
///
/// Each variant provides specific context about what went wrong,
/// enabling better error messages and programmatic error handling.
#[derive(Error, Debug)]
pub enum MediafluxError {
    // =========================================================================
    // Query Parameter Errors
    // =========================================================================
    /// Lookback window is not a plain duration literal (e.g. "30d", "1h").
    #[error("Invalid lookback window '{value}': expected a duration literal like 30d, 12h, 45m")]
    InvalidLookback { value: String },

    /// Result limit is not a positive integer.
    #[error("Invalid result limit {value}: must be at least 1")]
    InvalidLimit { value: i64 },

    /// A measurement, field, or column name is not a bare identifier.
    #[error("Invalid field or measurement name '{name}'")]
    InvalidFieldName { name: String },

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// HTTP transport failure talking to the backing store.
    #[error("Store connection error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store accepted the connection but rejected the write.
    #[error("Store rejected write (HTTP {status}): {body}")]
    WriteRejected { status: u16, body: String },

    /// The store accepted the connection but rejected the query.
    #[error("Store rejected query (HTTP {status}): {body}")]
    QueryRejected { status: u16, body: String },
}

/// Convenience result type for mediaflux operations.
pub type Result<T> = std::result::Result<T, MediafluxError>;
