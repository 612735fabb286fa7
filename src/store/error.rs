//! Error types for the persisted run state.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or appending the on-disk logs.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File system error while reading, appending, or rewriting a log file.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file or directory where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Creates an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
