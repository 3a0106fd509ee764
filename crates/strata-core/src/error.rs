//! Error taxonomy shared across the disk stack.

use thiserror::Error;

/// Errors from disk, metadata store and overlay operations.
///
/// Errors from an underlying disk surface to the caller verbatim; nothing in
/// the stack retries. `NotFound` is swallowed only where an operation's
/// contract explicitly permits it (`remove_file_if_exists`).
#[derive(Debug, Error)]
pub enum DiskError {
    /// Path does not exist, or is hidden by a removal
    #[error("no such file or directory: {0}")]
    NotFound(String),

    /// Create operation targets an extant path
    #[error("file exists: {0}")]
    AlreadyExists(String),

    /// Operation requires a directory but found a file
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Operation requires a file but found a directory
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Directory removal requires an empty directory
    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// The disk cannot perform this operation
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    /// Path failed normalization
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Underlying IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata store failure
    #[error("metadata error: {0}")]
    Metadata(String),

    /// Configuration failure
    #[error("config error: {0}")]
    Config(String),
}

impl DiskError {
    /// Returns true for the `NotFound` variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
