//! Error types for tfasync.
//!
//! Library crates use [`SyncError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Per-document misses (anchor not found, record without a title) are not
//! errors: they are reported as values by the extractor and injectors.

use std::path::PathBuf;

/// Top-level error type for all tfasync operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Store or relational-data parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Canonical store has the wrong shape (not a bundle, object without type or id).
    #[error("store error: {message}")]
    Store { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad identifier, malformed object, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
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

    /// Create a store-shape error from any displayable message.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
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

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SyncError::config("min_coverage must be within [0, 1]");
        assert_eq!(
            err.to_string(),
            "config error: min_coverage must be within [0, 1]"
        );

        let err = SyncError::validation("object has no id");
        assert!(err.to_string().contains("object has no id"));
    }

    #[test]
    fn io_error_keeps_path() {
        let err = SyncError::io(
            "stix/tfa-attack.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("tfa-attack.json"));
    }
}
