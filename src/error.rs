//! Error types for filedeck.

use thiserror::Error;

use crate::preview::PreviewError;

/// Common error type for filedeck.
#[derive(Error, Debug)]
pub enum FiledeckError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The target name is already taken.
    #[error("{0} already exists")]
    Conflict(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Preview generation error.
    #[error("preview error: {0}")]
    Preview(#[from] PreviewError),
}

/// Result type alias for filedeck operations.
pub type Result<T> = std::result::Result<T, FiledeckError>;
