//! Persisted run state: the known-URL log, the failure ledger, and the
//! on-disk asset check used as the resume oracle.
//!
//! All persistence is append-only. Each record is written with a single
//! `write_all` on a file opened in append mode, so one record is one line even
//! when several workers append concurrently.

mod error;
mod failure;
mod metadata;

pub use error::StoreError;
pub use failure::{FAILURE_FILE_NAME, FailureLedger, FailureRecord, MAX_ERROR_MESSAGE_CHARS};
pub use metadata::{
    DedupReport, KnownUrl, METADATA_FILE_NAME, MetadataStore, UNKNOWN_RESOLUTION, dedup_log_file,
};

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use tracing::{debug, warn};

use crate::item::ASSET_EXTENSION;

/// Minimum size an asset must exceed to count as a valid download.
pub const MIN_VALID_FILE_BYTES: u64 = 1024;

/// Suffix of an asset that is still being written.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Returns true if `path` exists and is strictly larger than `min_bytes`.
#[must_use]
pub fn is_valid_download(path: &Path, min_bytes: u64) -> bool {
    std::fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.len() > min_bytes)
}

/// Lists asset files already present in `dir` that pass the size check.
///
/// Leftover `.part` files from an interrupted run are deleted. A missing
/// directory yields an empty set.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the directory exists but cannot be read.
pub fn scan_valid_downloads(dir: &Path, min_bytes: u64) -> Result<HashSet<String>, StoreError> {
    let mut found = HashSet::new();
    if !dir.exists() {
        return Ok(found);
    }

    let entries = std::fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::io(dir, e))?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.ends_with(PARTIAL_SUFFIX) {
            match std::fs::remove_file(entry.path()) {
                Ok(()) => debug!(file = %name, "removed partial download"),
                Err(e) => warn!(file = %name, error = %e, "could not remove partial download"),
            }
            continue;
        }
        if !name.to_lowercase().ends_with(ASSET_EXTENSION) {
            continue;
        }
        if is_valid_download(&entry.path(), min_bytes) {
            found.insert(name);
        }
    }

    debug!(dir = %dir.display(), count = found.len(), "scanned existing downloads");
    Ok(found)
}

/// Replaces characters that would break the tab-separated line format.
pub(crate) fn sanitize_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

/// Appends one line to `path`, creating the file if needed.
pub(crate) fn append_line(path: &Path, fields: &[&str]) -> Result<(), StoreError> {
    let mut line = fields
        .iter()
        .map(|field| sanitize_field(field))
        .collect::<Vec<_>>()
        .join("\t");
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StoreError::io(path, e))?;
    file.write_all(line.as_bytes())
        .map_err(|e| StoreError::io(path, e))?;
    file.flush().map_err(|e| StoreError::io(path, e))
}
