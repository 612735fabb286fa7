//! Run orchestration: load persisted state, start the worker pool, crawl the
//! album, drain the queue, stop the workers, and report.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::browser::PageDriver;
use crate::config::{ConfigError, DownloaderConfig};
use crate::crawler::{AlbumCrawler, CrawlError, CrawlReport, CrawlSinks};
use crate::download::{
    DownloadState, Fetcher, RateLimitGate, RunStats, WorkQueue, WorkerContext, WorkerPool,
};
use crate::progress::{NoProgress, ProgressObserver};
use crate::resolver::SizeResolver;
use crate::store::{FailureLedger, MetadataStore, StoreError, scan_valid_downloads};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot load saved state: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Crawl(#[from] CrawlError),
}

/// Everything reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub stats: RunStats,
    pub crawl: CrawlReport,
    /// Valid files found by the startup scan.
    pub found_on_disk: usize,
    /// Filenames in the failure ledger at startup.
    pub previously_failed: usize,
    /// Filenames in the known-URL log after the run.
    pub known_urls: usize,
    pub metadata_path: PathBuf,
    pub failure_path: PathBuf,
    pub elapsed: Duration,
}

impl RunSummary {
    /// True if any download failed in this run.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.stats.failed > 0
    }
}

/// Downloads a whole album into one directory.
pub struct AlbumDownloader {
    config: DownloaderConfig,
    fetcher: Arc<dyn Fetcher>,
    progress: Arc<dyn ProgressObserver>,
}

impl AlbumDownloader {
    #[must_use]
    pub fn new(config: DownloaderConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            fetcher,
            progress: Arc::new(NoProgress),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressObserver>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Runs one complete pass over `album_url`, writing into `output_dir`.
    ///
    /// Workers start before crawling, so downloads overlap discovery. Items
    /// already present, failed, or throttled never abort the run; only
    /// configuration, the output directory, the saved state, or an unreachable
    /// album do.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] for the fatal cases above. Tasks queued before a
    /// crawl failure are still drained first.
    #[instrument(skip(self, driver), fields(output_dir = %output_dir.display()))]
    pub async fn run<D>(
        &self,
        driver: &mut D,
        album_url: &str,
        output_dir: &Path,
    ) -> Result<RunSummary, RunError>
    where
        D: PageDriver + ?Sized,
    {
        let started = Instant::now();
        self.config.validate()?;

        std::fs::create_dir_all(output_dir).map_err(|source| RunError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let mut metadata = MetadataStore::open(output_dir)?;
        let ledger = FailureLedger::in_dir(output_dir);
        let failed = ledger.load()?;
        let on_disk = scan_valid_downloads(output_dir, self.config.min_valid_bytes)?;
        let found_on_disk = on_disk.len();
        let previously_failed = failed.len();
        info!(
            found_on_disk,
            previously_failed,
            known_urls = metadata.len(),
            "loaded saved state"
        );

        let queue = Arc::new(WorkQueue::new());
        let state = Arc::new(DownloadState::new(
            output_dir,
            self.config.min_valid_bytes,
            on_disk,
            failed,
        ));
        let context = WorkerContext {
            queue: Arc::clone(&queue),
            state: Arc::clone(&state),
            gate: Arc::new(RateLimitGate::new(
                self.config.cooldown,
                self.config.cooldown_tick,
            )),
            fetcher: Arc::clone(&self.fetcher),
            ledger: ledger.clone(),
            progress: Arc::clone(&self.progress),
            fetch_timeout: self.config.fetch_timeout,
        };
        let pool = WorkerPool::spawn(self.config.workers, &context);

        let mut crawler = AlbumCrawler::new(
            self.config.crawl_settings(),
            SizeResolver::new(self.config.resolver_timing()),
        );
        let mut sinks = CrawlSinks {
            metadata: &mut metadata,
            state: &state,
            queue: &queue,
            progress: self.progress.as_ref(),
        };
        let crawled = crawler.crawl(driver, album_url, &mut sinks).await;

        info!(pending = queue.pending(), "waiting for downloads to finish");
        queue.join().await;
        pool.shutdown().await;

        let crawl = match crawled {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "crawl aborted");
                return Err(e.into());
            }
        };

        let summary = RunSummary {
            stats: state.stats(),
            crawl,
            found_on_disk,
            previously_failed,
            known_urls: metadata.len(),
            metadata_path: metadata.path().to_path_buf(),
            failure_path: ledger.path().to_path_buf(),
            elapsed: started.elapsed(),
        };
        info!(
            successful = summary.stats.successful,
            resumed = summary.stats.resumed,
            failed = summary.stats.failed,
            skipped = summary.stats.skipped + summary.stats.skipped_scan,
            rate_limited = summary.stats.rate_limited,
            elapsed_secs = summary.elapsed.as_secs(),
            "run complete"
        );
        Ok(summary)
    }
}
