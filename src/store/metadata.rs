//! Known-URL log (`photo_urls.txt`).
//!
//! One line per resolved item: `filename\turl\ttitle\tresolution_label`. The
//! in-memory map is rebuilt from the whole file at startup; a later line for
//! the same filename shadows an earlier one.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use super::{StoreError, append_line};

/// File name of the known-URL log inside the output directory.
pub const METADATA_FILE_NAME: &str = "photo_urls.txt";

/// Label recorded when the resolver could not classify the asset tier.
pub const UNKNOWN_RESOLUTION: &str = "unknown";

/// Cached resolution for one filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownUrl {
    pub url: String,
    pub title: String,
    pub resolution: String,
}

/// Append-only store of resolved asset URLs, keyed by filename.
#[derive(Debug)]
pub struct MetadataStore {
    path: PathBuf,
    known: HashMap<String, KnownUrl>,
    seen_urls: HashSet<String>,
}

impl MetadataStore {
    /// Opens the log inside `dir` and loads every existing record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read.
    #[instrument(level = "debug", fields(dir = %dir.display()))]
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(METADATA_FILE_NAME);
        let known = load_records(&path)?;
        let seen_urls = known.values().map(|k| k.url.clone()).collect();

        if !known.is_empty() {
            info!(count = known.len(), path = %path.display(), "loaded known URLs");
        }

        Ok(Self {
            path,
            known,
            seen_urls,
        })
    }

    /// Path of the underlying log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of distinct filenames with a cached URL.
    #[must_use]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Cached resolution for `filename`, if any.
    #[must_use]
    pub fn get(&self, filename: &str) -> Option<&KnownUrl> {
        self.known.get(filename)
    }

    /// True if `url` was already recorded (by this run or an earlier one).
    #[must_use]
    pub fn has_seen_url(&self, url: &str) -> bool {
        self.seen_urls.contains(url)
    }

    /// Durably appends one record, then updates the in-memory map.
    ///
    /// The write happens before the caller queues the task, so the log never
    /// lags behind the queue.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the append fails; the in-memory map is left
    /// unchanged in that case.
    pub fn append_record(
        &mut self,
        filename: &str,
        url: &str,
        title: &str,
        resolution: &str,
    ) -> Result<(), StoreError> {
        append_line(&self.path, &[filename, url, title, resolution])?;
        debug!(filename, url, resolution, "recorded resolved URL");

        self.seen_urls.insert(url.to_string());
        self.known.insert(
            filename.to_string(),
            KnownUrl {
                url: url.to_string(),
                title: title.to_string(),
                resolution: resolution.to_string(),
            },
        );
        Ok(())
    }
}

fn load_records(path: &Path) -> Result<HashMap<String, KnownUrl>, StoreError> {
    let mut known = HashMap::new();
    if !path.exists() {
        return Ok(known);
    }

    let raw = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    for line in raw.lines() {
        let line = line.trim_end();
        let mut parts = line.split('\t');
        let (Some(filename), Some(url)) = (parts.next(), parts.next()) else {
            continue;
        };
        if filename.is_empty() || url.is_empty() {
            continue;
        }
        let title = parts.next().unwrap_or_default().to_string();
        let resolution = parts
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_RESOLUTION)
            .to_string();
        known.insert(
            filename.to_string(),
            KnownUrl {
                url: url.to_string(),
                title,
                resolution,
            },
        );
    }
    Ok(known)
}

/// Outcome of deduplicating one log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupReport {
    pub path: PathBuf,
    /// Line count before deduplication, blank lines included.
    pub original_lines: usize,
    pub unique_lines: usize,
    /// Backup written before rewriting; `None` when nothing was removed.
    pub backup: Option<PathBuf>,
}

impl DedupReport {
    #[must_use]
    pub fn removed(&self) -> usize {
        self.original_lines - self.unique_lines
    }
}

/// Removes exact duplicate lines from a known-URL log, keeping first occurrences.
///
/// Blank lines are dropped. When anything changes, the original file is renamed
/// to `<name>.bak` before the deduplicated content is written.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if reading, renaming, or writing fails.
pub fn dedup_log_file(path: &Path) -> Result<DedupReport, StoreError> {
    let raw = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let original_lines = raw.lines().count();

    let mut seen = HashSet::new();
    let unique: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(*line))
        .collect();

    let mut report = DedupReport {
        path: path.to_path_buf(),
        original_lines,
        unique_lines: unique.len(),
        backup: None,
    };
    if report.removed() == 0 {
        return Ok(report);
    }

    let mut backup = path.as_os_str().to_owned();
    backup.push(".bak");
    let backup = PathBuf::from(backup);
    std::fs::rename(path, &backup).map_err(|e| StoreError::io(&backup, e))?;

    let mut content = unique.join("\n");
    content.push('\n');
    std::fs::write(path, content).map_err(|e| StoreError::io(path, e))?;

    report.backup = Some(backup);
    Ok(report)
}
