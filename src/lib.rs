//! Album Downloader Library
//!
//! Crawls a paginated, infinite-scroll photo album, resolves every item to its
//! largest available asset, and downloads the assets into one directory. A run
//! can be interrupted at any point; the next run picks up where it stopped.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`browser`] - Page driver abstraction and the Chromium implementation
//! - [`crawler`] - Album pagination, lazy-load scrolling, card extraction
//! - [`resolver`] - Detail page to largest-asset resolution
//! - [`download`] - Work queue, rate-limit gate, and the worker pool
//! - [`store`] - Known-URL log, failure ledger, and the on-disk resume check
//! - [`orchestrator`] - Wires everything into one run

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod browser;
pub mod config;
pub mod crawler;
pub mod download;
pub mod item;
pub mod orchestrator;
pub mod progress;
pub mod resolver;
pub mod store;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use browser::{ChromeDriver, ChromeOptions, DriverError, ElementSnapshot, PageDriver};
pub use config::{ConfigError, DownloaderConfig};
pub use crawler::{AlbumCrawler, CrawlError, CrawlReport};
pub use download::{
    DownloadError, FetchResponse, Fetcher, HttpClient, RunStats, TaskOutcome,
};
pub use item::{AlbumItem, DownloadTask, PhotoId, derive_filename, sanitize_title};
pub use orchestrator::{AlbumDownloader, RunError, RunSummary};
pub use progress::{NoProgress, ProgressObserver};
pub use resolver::{ResolvedAsset, SizeResolver};
pub use store::{FailureLedger, MetadataStore, StoreError, dedup_log_file};
