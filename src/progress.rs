//! Progress reporting hooks.
//!
//! The library never draws anything itself; the binary plugs in an
//! indicatif-backed observer. Every hook has a no-op default.

use std::time::Duration;

use crate::download::TaskOutcome;
use crate::item::DownloadTask;

/// Receives progress events from the crawler and the workers.
///
/// Called from several tasks at once, so implementations must be `Send + Sync`.
pub trait ProgressObserver: Send + Sync {
    /// Total item count read from the album header, when available.
    fn album_total(&self, _photos: usize) {}

    /// The crawler found a valid file on disk and queued nothing.
    fn skipped_during_scan(&self, _filename: &str) {}

    /// A worker finished one dequeued task.
    fn task_finished(&self, _task: &DownloadTask, _outcome: &TaskOutcome) {}

    /// A rate-limit cooldown started.
    fn cooldown_started(&self, _duration: Duration) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}
