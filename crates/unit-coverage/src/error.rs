//! Result and error types for unit-coverage.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for coverage operations
pub type CoverageResult<T> = Result<T, CoverageError>;

/// Errors that can occur while merging, completing or reporting coverage
#[derive(Debug, Error)]
pub enum CoverageError {
    /// I/O failure on a specific path
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path that was being read, listed or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Console write failure
    #[error("Failed to write report to console: {0}")]
    Console(#[source] std::io::Error),

    /// Coverage payload could not be decoded
    #[error("Failed to decode coverage data: {message}")]
    Decode {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Glob pattern could not be compiled
    #[error("Invalid pattern \"{pattern}\": {message}")]
    Pattern {
        /// Offending pattern
        pattern: String,
        /// Error message
        message: String,
    },

    /// No file set registered under the configured name
    #[error("File set \"{name}\" not found")]
    FileSetNotFound {
        /// Requested file set name
        name: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoverageError {
    /// Create an I/O error bound to a path
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a decode error
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a pattern error
    #[must_use]
    pub fn pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a file-set-not-found error
    #[must_use]
    pub fn file_set_not_found(name: impl Into<String>) -> Self {
        Self::FileSetNotFound { name: name.into() }
    }
}
