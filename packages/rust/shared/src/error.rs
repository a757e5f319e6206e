//! Error types for the advisory generator.
//!
//! Library crates use [`AdvisoryError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all generator operations.
///
/// Only unrecoverable conditions end up here. A malformed record file or a
/// record missing a required field is reported per record and never aborts
/// a run.
#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Structured data could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Data validation error (missing field, value outside a lookup table).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Page template is malformed or could not be filled.
    #[error("template error: {message}")]
    Template { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AdvisoryError>;

impl AdvisoryError {
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

    /// Create a template error from any displayable message.
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template {
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
