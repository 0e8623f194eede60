//! Error types for the analysis crate.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, aggregating or persisting.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Aggregation name outside `count|sum|avg|min|max`.
    #[error("unknown aggregation '{0}', expected one of count, sum, avg, min, max")]
    UnknownAggregation(String),

    /// A date that does not parse.
    #[error("invalid date '{value}': {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A date range whose end precedes its start.
    #[error("date range ends ({to}) before it starts ({from})")]
    InvertedRange { from: String, to: String },

    /// A dataset file that could not be read.
    #[error("failed to read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A dataset that is not a JSON array of objects.
    #[error("dataset {path} is not a JSON array of records")]
    NotRecords { path: PathBuf },

    /// Key-value store I/O failure.
    #[error("store I/O failed: {0}")]
    Store(#[from] io::Error),

    /// JSON encoding or decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV encoding failure.
    #[error("CSV error: {0}")]
    Csv(String),

    /// A preset name that is not stored.
    #[error("no saved filter named '{0}'")]
    UnknownPreset(String),
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
