//! Worker pool behaviour under concurrency, against a mock asset host.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use album_downloader::download::{
    DownloadState, RateLimitGate, WorkQueue, WorkerContext, WorkerPool,
};
use album_downloader::store::{FAILURE_FILE_NAME, FailureLedger, MIN_VALID_FILE_BYTES};
use album_downloader::{DownloadTask, Fetcher, HttpClient, NoProgress};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, Request, Respond, ResponseTemplate};

mod support;
use support::start_mock_server_or_skip;

const ASSET_BYTES: usize = 4096;

fn context(dir: &Path, cooldown: Duration) -> WorkerContext {
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpClient::new());
    WorkerContext {
        queue: Arc::new(WorkQueue::new()),
        state: Arc::new(DownloadState::new(
            dir,
            MIN_VALID_FILE_BYTES,
            HashSet::new(),
            HashSet::new(),
        )),
        gate: Arc::new(RateLimitGate::new(cooldown, Duration::from_millis(50))),
        fetcher,
        ledger: FailureLedger::in_dir(dir),
        progress: Arc::new(NoProgress),
        fetch_timeout: Duration::from_secs(5),
    }
}

/// Answers the first request with a slow 429, then serves the asset.
struct SlowThrottleOnce {
    hits: Arc<AtomicUsize>,
}

impl Respond for SlowThrottleOnce {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        if self.hits.fetch_add(1, Ordering::SeqCst) == 0 {
            ResponseTemplate::new(429).set_delay(Duration::from_millis(100))
        } else {
            ResponseTemplate::new(200).set_body_bytes(vec![7u8; ASSET_BYTES])
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_rate_limits_share_one_cooldown() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let hits_a = Arc::new(AtomicUsize::new(0));
    let hits_b = Arc::new(AtomicUsize::new(0));
    for (asset, hits) in [("/live/a_o.jpg", &hits_a), ("/live/b_o.jpg", &hits_b)] {
        Mock::given(method("GET"))
            .and(path(asset))
            .respond_with(SlowThrottleOnce {
                hits: Arc::clone(hits),
            })
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().expect("temp dir");
    let ctx = context(dir.path(), Duration::from_millis(300));
    ctx.queue.push(DownloadTask::new(
        format!("{}/live/a_o.jpg", server.uri()),
        "a_1.jpg",
        1,
    ));
    ctx.queue.push(DownloadTask::new(
        format!("{}/live/b_o.jpg", server.uri()),
        "b_2.jpg",
        2,
    ));

    let pool = WorkerPool::spawn(2, &ctx);
    ctx.queue.join().await;
    pool.shutdown().await;

    let stats = ctx.state.stats();
    assert_eq!(ctx.gate.cooldowns_completed(), 1);
    assert_eq!(stats.rate_limited, 2);
    assert_eq!(stats.successful, 2);
    assert_eq!(stats.failed, 0);
    assert_eq!(hits_a.load(Ordering::SeqCst), 2);
    assert_eq!(hits_b.load(Ordering::SeqCst), 2);
    assert!(dir.path().join("a_1.jpg").exists());
    assert!(dir.path().join("b_2.jpg").exists());
    assert!(!dir.path().join(FAILURE_FILE_NAME).exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tasks_sharing_a_filename_fetch_once() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/live/c_o.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![7u8; ASSET_BYTES])
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    let ctx = context(dir.path(), Duration::from_millis(50));
    let url = format!("{}/live/c_o.jpg", server.uri());
    ctx.queue.push(DownloadTask::new(url.clone(), "c_3.jpg", 1));
    ctx.queue.push(DownloadTask::new(url, "c_3.jpg", 2));

    let pool = WorkerPool::spawn(2, &ctx);
    ctx.queue.join().await;
    pool.shutdown().await;

    let stats = ctx.state.stats();
    assert_eq!(stats.successful, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.failed, 0);
    let written = std::fs::metadata(dir.path().join("c_3.jpg")).expect("asset written");
    assert_eq!(written.len(), ASSET_BYTES as u64);
}
