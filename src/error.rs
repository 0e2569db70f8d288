//! Error types for the loading boundary
//!
//! Layout, fitting, correlation and selection never fail: they degrade to
//! empty or partial results. Only reading configuration and graph files from
//! disk can produce an error.

use thiserror::Error;

/// Errors that can occur while loading inputs or configuration
#[derive(Error, Debug)]
pub enum LayoutError {
    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A parsing error occurred
    #[error("parse error: {0}")]
    Parse(String),

    /// The file format is not supported
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for LayoutError {
    fn from(err: serde_json::Error) -> Self {
        LayoutError::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for LayoutError {
    fn from(err: serde_yaml::Error) -> Self {
        LayoutError::Parse(err.to_string())
    }
}

/// Result type for loading operations
pub type LayoutResult<T> = Result<T, LayoutError>;
