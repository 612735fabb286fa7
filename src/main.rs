//! CLI entry point for the album downloader.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use album_downloader::{
    AlbumDownloader, ChromeDriver, ChromeOptions, DownloaderConfig, Fetcher, HttpClient,
    RunSummary,
};
use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info, warn};
use url::Url;

mod app_config;
mod cli;
mod progress_bar;

use app_config::{FileConfig, load_default_file_config};
use cli::{Args, DEFAULT_OUTPUT_DIR};
use progress_bar::{ProgressReporter, is_dumb_terminal, should_show_progress};

/// Effective settings after layering defaults, the config file, and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RunSettings {
    config: DownloaderConfig,
    output_dir: PathBuf,
    headed: bool,
}

fn resolve_settings(args: &Args, file: Option<&FileConfig>) -> RunSettings {
    let file = file.cloned().unwrap_or_default();
    let mut config = DownloaderConfig::default();

    if let Some(workers) = args.workers.or(file.workers) {
        config.workers = usize::from(workers);
    }
    if let Some(minutes) = args.cooldown_minutes.or(file.cooldown_minutes) {
        config.cooldown = Duration::from_secs(minutes * 60);
    }
    if let Some(secs) = file.fetch_timeout_secs {
        config.fetch_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.page_load_timeout_secs {
        config.page_load_timeout = Duration::from_secs(secs);
    }

    let output_dir = args
        .output_dir
        .clone()
        .or(file.output_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    RunSettings {
        config,
        output_dir,
        headed: args.headed || file.headed.unwrap_or(false),
    }
}

fn validate_album_url(raw: &str) -> Result<()> {
    let url = Url::parse(raw).with_context(|| format!("Invalid album URL '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Album URL must use http or https: '{raw}'");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();

    debug!(?args, "CLI arguments parsed");

    let loaded = load_default_file_config()?;
    if let Some(path) = loaded.path.as_deref().filter(|_| loaded.config.is_some()) {
        info!(path = %path.display(), "Loaded config file");
    }

    validate_album_url(&args.album_url)?;
    let settings = resolve_settings(&args, loaded.config.as_ref());
    settings.config.validate()?;

    info!(
        album = %args.album_url,
        output_dir = %settings.output_dir.display(),
        workers = settings.config.workers,
        "Album downloader starting"
    );

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpClient::new());
    let reporter = Arc::new(ProgressReporter::new(should_show_progress(
        io::stderr().is_terminal(),
        args.quiet,
        is_dumb_terminal(),
    )));

    let options = ChromeOptions {
        headed: settings.headed,
        ..ChromeOptions::from_env()
    };
    let mut driver = ChromeDriver::launch(&options)
        .await
        .context("Failed to start the browser")?;

    let downloader = AlbumDownloader::new(settings.config, fetcher).with_progress(reporter.clone());
    let outcome = downloader
        .run(&mut driver, &args.album_url, &settings.output_dir)
        .await;

    reporter.finish();
    if let Err(e) = driver.close().await {
        warn!(error = %e, "Browser did not shut down cleanly");
    }

    let summary = outcome.context("Album download failed")?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    info!(
        items = summary.crawl.cards,
        pages = summary.crawl.total_pages,
        downloaded = stats.successful,
        resumed = stats.resumed,
        failed = stats.failed,
        skipped = stats.skipped + stats.skipped_scan,
        from_cache = stats.from_cache,
        rate_limited = stats.rate_limited,
        elapsed_secs = summary.elapsed.as_secs(),
        "Download summary"
    );
    if summary.found_on_disk > 0 || summary.previously_failed > 0 {
        info!(
            found_on_disk = summary.found_on_disk,
            previously_failed = summary.previously_failed,
            resumed = stats.resumed,
            "Resumed from an earlier run"
        );
    }
    info!(path = %summary.metadata_path.display(), urls = summary.known_urls, "Resolved URLs saved");

    if summary.has_failures() {
        warn!(
            failed = stats.failed,
            path = %summary.failure_path.display(),
            "Some photos failed; run the same command again to retry them"
        );
    }
}
