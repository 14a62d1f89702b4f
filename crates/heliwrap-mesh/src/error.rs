//! Error types for mesh loading and saving.

use thiserror::Error;

/// Errors that can occur while reading or writing mesh files.
#[derive(Error, Debug)]
pub enum MeshError {
    /// Underlying I/O failure.
    #[error("mesh i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// File extension not recognized.
    #[error("unsupported mesh format: {0}")]
    UnsupportedFormat(String),

    /// File content does not match its declared format.
    #[error("malformed mesh file: {0}")]
    Malformed(String),
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
