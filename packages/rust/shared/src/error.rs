//! Error types for pipelens.
//!
//! Library crates use [`PipelensError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Only ingestion, schema checks, and criteria construction are fallible.
//! Aggregators degrade to empty results instead of returning errors.

use std::path::PathBuf;

/// Top-level error type for all pipelens operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelensError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed CSV input (unbalanced quotes, ragged records, bad UTF-8).
    #[error("csv error: {0}")]
    Csv(String),

    /// One or more required source columns are missing. Aborts all aggregation.
    #[error("missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    /// The input table has a header but no data rows.
    #[error("dataset is empty")]
    EmptyDataset,

    /// Invalid caller input (filter tokens, CLI arguments, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PipelensError>;

impl PipelensError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a schema error listing the missing column names.
    pub fn schema<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Schema {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Missing column names when this is a schema error.
    pub fn missing_columns(&self) -> &[String] {
        match self {
            Self::Schema { missing } => missing,
            _ => &[],
        }
    }
}

impl From<csv::Error> for PipelensError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}
