//! Error types for clubfeed.
//!
//! Library crates use [`ClubfeedError`] via `thiserror`.
//! App crates (ingest/server) wrap this with `color-eyre` for rich diagnostics.
//! Row-level mapping failures have their own type in `clubfeed-mapper`, since
//! they are isolated per row rather than propagated.

use std::path::PathBuf;

/// Top-level error type for all clubfeed operations.
#[derive(Debug, thiserror::Error)]
pub enum ClubfeedError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching taxonomies or sheet values.
    #[error("network error: {0}")]
    Network(String),

    /// Service-account credential or token exchange error.
    #[error("auth error: {0}")]
    Auth(String),

    /// The spreadsheet API answered, but not with usable data.
    #[error("sheets error for {spreadsheet_id}: {message}")]
    Sheets {
        spreadsheet_id: String,
        message: String,
    },

    /// A sheet's header row does not satisfy the column schema.
    #[error("schema error for {spreadsheet_id}: missing required columns {missing:?}")]
    Schema {
        spreadsheet_id: String,
        missing: Vec<String>,
    },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON or document parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ClubfeedError>;

impl ClubfeedError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a sheets error scoped to one spreadsheet.
    pub fn sheets(spreadsheet_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Sheets {
            spreadsheet_id: spreadsheet_id.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ClubfeedError::config("FILENAME_KEY is not set");
        assert_eq!(err.to_string(), "config error: FILENAME_KEY is not set");

        let err = ClubfeedError::sheets("abc123", "HTTP 403 Forbidden");
        assert_eq!(
            err.to_string(),
            "sheets error for abc123: HTTP 403 Forbidden"
        );
    }

    #[test]
    fn schema_error_lists_columns() {
        let err = ClubfeedError::Schema {
            spreadsheet_id: "abc123".into(),
            missing: vec!["Timestamp".into(), "Verified".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("abc123"));
        assert!(msg.contains("\"Timestamp\""));
        assert!(msg.contains("\"Verified\""));
    }
}
