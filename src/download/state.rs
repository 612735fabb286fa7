//! Shared per-run bookkeeping: which filenames are done, in flight, or failed,
//! plus the run counters.
//!
//! One mutex guards all of it so a membership test and the insert that follows
//! are atomic with respect to every other worker.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::store::is_valid_download;

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Fresh downloads that had never failed before.
    pub successful: usize,
    /// Terminal failures in this run.
    pub failed: usize,
    /// Tasks dropped by a worker because the file was already valid or in flight.
    pub skipped: usize,
    /// Items skipped by the crawler because the file was already on disk.
    pub skipped_scan: usize,
    /// Downloads that succeeded after an earlier recorded failure.
    pub resumed: usize,
    /// Tasks queued from the known-URL log without resolving again.
    pub from_cache: usize,
    /// Fetches answered with HTTP 429 and put back on the queue.
    pub rate_limited: usize,
}

impl RunStats {
    /// Files written by this run, fresh and resumed.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.successful + self.resumed
    }
}

/// Result of [`DownloadState::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The caller now owns the download.
    Claimed,
    /// A valid file already exists.
    AlreadyDownloaded,
    /// Another worker is downloading the same filename.
    InFlight,
}

#[derive(Debug, Default)]
struct Inner {
    downloaded: HashSet<String>,
    in_flight: HashSet<String>,
    failed: HashSet<String>,
    stats: RunStats,
}

/// Thread-safe run state shared by the crawler and every worker.
#[derive(Debug)]
pub struct DownloadState {
    output_dir: PathBuf,
    min_valid_bytes: u64,
    inner: Mutex<Inner>,
}

impl DownloadState {
    /// Seeds the state from the startup scan and the failure ledger.
    #[must_use]
    pub fn new(
        output_dir: impl Into<PathBuf>,
        min_valid_bytes: u64,
        downloaded: HashSet<String>,
        failed: HashSet<String>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            min_valid_bytes,
            inner: Mutex::new(Inner {
                downloaded,
                failed,
                ..Inner::default()
            }),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn min_valid_bytes(&self) -> u64 {
        self.min_valid_bytes
    }

    /// Where `filename` is written.
    #[must_use]
    pub fn target_path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }

    /// True if `filename` is known to be downloaded or a valid file exists on disk.
    ///
    /// A valid file found on disk but missing from memory is added to the
    /// in-memory set.
    #[must_use]
    pub fn is_already_downloaded(&self, filename: &str) -> bool {
        let mut inner = self.lock();
        if inner.downloaded.contains(filename) {
            return true;
        }
        if is_valid_download(&self.target_path(filename), self.min_valid_bytes) {
            debug!(filename, "found valid file missing from memory");
            inner.downloaded.insert(filename.to_string());
            return true;
        }
        false
    }

    /// Atomically checks and reserves `filename` for download.
    #[must_use]
    pub fn claim(&self, filename: &str) -> Claim {
        let mut inner = self.lock();
        if inner.downloaded.contains(filename) {
            return Claim::AlreadyDownloaded;
        }
        if inner.in_flight.contains(filename) {
            return Claim::InFlight;
        }
        if is_valid_download(&self.target_path(filename), self.min_valid_bytes) {
            inner.downloaded.insert(filename.to_string());
            return Claim::AlreadyDownloaded;
        }
        inner.in_flight.insert(filename.to_string());
        Claim::Claimed
    }

    /// Records a finished download. Returns true if it had failed before
    /// (counted as resumed rather than successful).
    pub fn complete_success(&self, filename: &str) -> bool {
        let mut inner = self.lock();
        inner.in_flight.remove(filename);
        inner.downloaded.insert(filename.to_string());
        let resumed = inner.failed.remove(filename);
        if resumed {
            inner.stats.resumed += 1;
        } else {
            inner.stats.successful += 1;
        }
        resumed
    }

    /// Records a terminal failure. Returns true if the filename was not already
    /// marked failed, i.e. the failure ledger needs a new line.
    pub fn complete_failure(&self, filename: &str) -> bool {
        let mut inner = self.lock();
        inner.in_flight.remove(filename);
        inner.stats.failed += 1;
        inner.failed.insert(filename.to_string())
    }

    /// Gives up a throttled claim so the task can be requeued, and counts the throttle.
    pub fn release_rate_limited(&self, filename: &str) {
        let mut inner = self.lock();
        inner.in_flight.remove(filename);
        inner.stats.rate_limited += 1;
    }

    pub fn record_skipped(&self) {
        self.lock().stats.skipped += 1;
    }

    pub fn record_skipped_scan(&self) {
        self.lock().stats.skipped_scan += 1;
    }

    pub fn record_from_cache(&self) {
        self.lock().stats.from_cache += 1;
    }

    #[must_use]
    pub fn is_failed(&self, filename: &str) -> bool {
        self.lock().failed.contains(filename)
    }

    /// Size of the downloaded set.
    #[must_use]
    pub fn downloaded_count(&self) -> usize {
        self.lock().downloaded.len()
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> RunStats {
        self.lock().stats
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
