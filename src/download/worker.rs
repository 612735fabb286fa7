//! Download workers.
//!
//! Each worker loops: take a message, claim the filename, wait for the rate
//! limit gate, fetch, write, record the outcome, mark the task done. A 429
//! releases the claim, triggers the shared cooldown, and puts the same task
//! back on the queue before it is marked done.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::client::Fetcher;
use super::constants::STATUS_TOO_MANY_REQUESTS;
use super::error::DownloadError;
use super::gate::RateLimitGate;
use super::queue::{QueueMessage, WorkQueue};
use super::state::{Claim, DownloadState};
use crate::item::DownloadTask;
use crate::progress::ProgressObserver;
use crate::store::{FailureLedger, FailureRecord, PARTIAL_SUFFIX};

/// What happened to one dequeued task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Nothing fetched: a valid file existed or another worker had the filename.
    Skipped,
    /// File written; `resumed` if the filename had failed before.
    Downloaded { bytes: u64, resumed: bool },
    /// Terminal failure, recorded in the ledger unless already present.
    Failed { error: String },
    /// Throttled; the task went back on the queue.
    Requeued,
}

/// Everything a worker needs, shared by the whole pool.
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: Arc<WorkQueue>,
    pub state: Arc<DownloadState>,
    pub gate: Arc<RateLimitGate>,
    pub fetcher: Arc<dyn Fetcher>,
    pub ledger: FailureLedger,
    pub progress: Arc<dyn ProgressObserver>,
    pub fetch_timeout: Duration,
}

/// A fixed set of spawned workers draining one [`WorkQueue`].
pub struct WorkerPool {
    queue: Arc<WorkQueue>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `count` workers on the current runtime.
    #[must_use]
    pub fn spawn(count: usize, context: &WorkerContext) -> Self {
        let handles = (0..count)
            .map(|id| {
                let context = context.clone();
                tokio::spawn(async move { run_worker(id, context).await })
            })
            .collect();
        info!(workers = count, "started download workers");
        Self {
            queue: Arc::clone(&context.queue),
            handles,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Sends one shutdown message per worker and waits for all of them to exit.
    pub async fn shutdown(self) {
        for _ in 0..self.handles.len() {
            self.queue.push_shutdown();
        }
        for handle in self.handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "download worker ended abnormally");
            }
        }
        debug!("all download workers stopped");
    }
}

async fn run_worker(id: usize, context: WorkerContext) {
    debug!(worker = id, "worker started");
    while let Some(message) = context.queue.next().await {
        let QueueMessage::Task(task) = message else {
            break;
        };
        let outcome = process_task(&context, &task).await;
        context.progress.task_finished(&task, &outcome);
        context.queue.task_done();
    }
    debug!(worker = id, "worker stopped");
}

/// Runs one task to an outcome. Does not call `task_done`.
#[instrument(level = "debug", skip(context, task), fields(filename = %task.filename, seq = task.sequence))]
pub async fn process_task(context: &WorkerContext, task: &DownloadTask) -> TaskOutcome {
    match context.state.claim(&task.filename) {
        Claim::Claimed => {}
        Claim::AlreadyDownloaded | Claim::InFlight => {
            context.state.record_skipped();
            debug!("already downloaded or in flight, skipping");
            return TaskOutcome::Skipped;
        }
    }

    context.gate.wait_open().await;

    let error = match context.fetcher.get(&task.url, context.fetch_timeout).await {
        Ok(response) if response.is_ok() => {
            let path = context.state.target_path(&task.filename);
            match write_asset(&path, &response.body, context.state.min_valid_bytes()).await {
                Ok(bytes) => {
                    let resumed = context.state.complete_success(&task.filename);
                    info!(bytes, resumed, "downloaded");
                    return TaskOutcome::Downloaded { bytes, resumed };
                }
                Err(err) => err,
            }
        }
        Ok(response) if response.status == STATUS_TOO_MANY_REQUESTS => {
            context.state.release_rate_limited(&task.filename);
            context.progress.cooldown_started(context.gate.cooldown());
            context.gate.cool_down().await;
            context.queue.push(task.clone());
            info!("requeued after rate limit cooldown");
            return TaskOutcome::Requeued;
        }
        Ok(response) => DownloadError::http_status(&task.url, response.status),
        Err(err) => err,
    };

    warn!(error = %error, transport = error.is_transport(), "download failed");
    let message = error.ledger_message();
    if context.state.complete_failure(&task.filename) {
        let record = FailureRecord::new(&task.filename, &task.url, &message);
        if let Err(err) = context.ledger.append(&record) {
            warn!(error = %err, "could not record failed download");
        }
    }
    TaskOutcome::Failed { error: message }
}

/// Writes `body` to `path` through a temporary file and checks the final size.
///
/// A result not larger than `min_bytes` is deleted and reported as
/// [`DownloadError::Undersized`].
async fn write_asset(path: &Path, body: &[u8], min_bytes: u64) -> Result<u64, DownloadError> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(PARTIAL_SUFFIX);
    let partial = PathBuf::from(partial);

    tokio::fs::write(&partial, body)
        .await
        .map_err(|e| DownloadError::io(&partial, e))?;
    tokio::fs::rename(&partial, path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;

    let bytes = tokio::fs::metadata(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?
        .len();
    if bytes <= min_bytes {
        if let Err(err) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %err, "could not remove undersized file");
        }
        return Err(DownloadError::undersized(path, bytes, min_bytes));
    }
    Ok(bytes)
}
