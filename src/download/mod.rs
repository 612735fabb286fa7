//! Concurrent asset download pool.
//!
//! This module takes resolved [`DownloadTask`](crate::item::DownloadTask)s from
//! a joinable queue and writes them into the output directory.
//!
//! # Features
//!
//! - Fixed pool of workers sharing one [`WorkQueue`]
//! - Atomic claim of each filename, so a file is written at most once per run
//! - Global cooldown on HTTP 429 with requeue of the throttled task
//! - Size check on every written file (undersized files are removed)
//! - Append-only failure ledger, one line per newly failed filename
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use album_downloader::download::{Fetcher, HttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher: Arc<dyn Fetcher> = Arc::new(HttpClient::new());
//! let response = fetcher
//!     .get("https://live.staticflickr.com/1/2_o.jpg", std::time::Duration::from_secs(30))
//!     .await?;
//! println!("status {}", response.status);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod gate;
mod queue;
mod state;
mod worker;

pub use client::{FetchResponse, Fetcher, HttpClient};
pub use error::DownloadError;
pub use gate::{CooldownRole, RateLimitGate};
pub use queue::{QueueMessage, WorkQueue};
pub use state::{Claim, DownloadState, RunStats};
pub use worker::{TaskOutcome, WorkerContext, WorkerPool, process_task};
