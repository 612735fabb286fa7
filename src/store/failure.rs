//! Failure ledger (`failed_downloads.txt`).
//!
//! A historical log, never rewritten: `filename\turl\terror`. Loading it yields
//! the set of filenames that need a retry; clearing a failure after a later
//! success only touches that in-memory set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{StoreError, append_line};

/// File name of the failure ledger inside the output directory.
pub const FAILURE_FILE_NAME: &str = "failed_downloads.txt";

/// Error messages are cut to this many characters before being logged.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 100;

/// One terminal download failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub filename: String,
    pub url: String,
    pub error: String,
}

impl FailureRecord {
    /// Creates a record, truncating `error` to [`MAX_ERROR_MESSAGE_CHARS`].
    #[must_use]
    pub fn new(filename: impl Into<String>, url: impl Into<String>, error: &str) -> Self {
        Self {
            filename: filename.into(),
            url: url.into(),
            error: error.chars().take(MAX_ERROR_MESSAGE_CHARS).collect(),
        }
    }
}

/// Append-only ledger of failed downloads.
#[derive(Debug, Clone)]
pub struct FailureLedger {
    path: PathBuf,
}

impl FailureLedger {
    /// Ledger stored inside `dir`. Nothing is read until [`load`](Self::load).
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(FAILURE_FILE_NAME),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the filenames of every recorded failure.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read.
    pub fn load(&self) -> Result<HashSet<String>, StoreError> {
        let mut failed = HashSet::new();
        if !self.path.exists() {
            return Ok(failed);
        }

        let raw = std::fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        for line in raw.lines() {
            let filename = line.split('\t').next().unwrap_or_default();
            if !filename.is_empty() {
                failed.insert(filename.to_string());
            }
        }

        if !failed.is_empty() {
            info!(count = failed.len(), "found earlier failed downloads to retry");
        }
        Ok(failed)
    }

    /// Appends one failure line.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the append fails.
    pub fn append(&self, record: &FailureRecord) -> Result<(), StoreError> {
        append_line(&self.path, &[&record.filename, &record.url, &record.error])?;
        debug!(filename = %record.filename, error = %record.error, "recorded failed download");
        Ok(())
    }
}
