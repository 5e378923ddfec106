//! Error types for resourcesync.
//!
//! Library crates use [`ResourceSyncError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//! Per-item fetch failures have their own typed taxonomy in the
//! `resourcesync-fetch` crate; this type covers infrastructure errors
//! that should abort an operation.

use std::path::PathBuf;

/// Top-level error type for resourcesync operations.
#[derive(Debug, thiserror::Error)]
pub enum ResourceSyncError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to the document corpus.
    #[error("corpus error: {0}")]
    Corpus(String),

    /// Capture store read/write error.
    #[error("store error: {0}")]
    Store(String),

    /// The remote browser endpoint is required but unreachable.
    #[error("browser unavailable: {0}")]
    BrowserUnavailable(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed metadata, bad URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ResourceSyncError>;

impl ResourceSyncError {
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

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
