//! Run configuration for [`AlbumDownloader`](crate::AlbumDownloader).

use std::time::Duration;

use thiserror::Error;

use crate::crawler::CrawlSettings;
use crate::download::constants::{
    COOLDOWN_TICK, DEFAULT_COOLDOWN, DEFAULT_WORKERS, FETCH_TIMEOUT_SECS, MAX_WORKERS,
};
use crate::resolver::ResolverTiming;
use crate::store::MIN_VALID_FILE_BYTES;

/// Errors from [`DownloaderConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid worker count {value}: must be between 1 and {max}", max = MAX_WORKERS)]
    InvalidWorkers { value: usize },

    #[error("`{field}` must be greater than zero")]
    Zero { field: &'static str },
}

/// Every tunable of a run. [`Default`] matches the service's known-good pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderConfig {
    pub workers: usize,
    pub fetch_timeout: Duration,
    pub page_load_timeout: Duration,
    pub scroll_settle: Duration,
    pub page_pause: Duration,
    pub resolver_settle: Duration,
    pub original_settle: Duration,
    pub cooldown: Duration,
    pub cooldown_tick: Duration,
    pub min_valid_bytes: u64,
    pub max_scroll_attempts: usize,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        let crawl = CrawlSettings::default();
        let resolver = ResolverTiming::default();
        Self {
            workers: DEFAULT_WORKERS,
            fetch_timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
            page_load_timeout: crawl.page_load_timeout,
            scroll_settle: crawl.scroll_settle,
            page_pause: crawl.page_pause,
            resolver_settle: resolver.settle,
            original_settle: resolver.original_settle,
            cooldown: DEFAULT_COOLDOWN,
            cooldown_tick: COOLDOWN_TICK,
            min_valid_bytes: MIN_VALID_FILE_BYTES,
            max_scroll_attempts: crawl.max_scroll_attempts,
        }
    }
}

impl DownloaderConfig {
    /// Checks ranges that would stall or break a run.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_WORKERS).contains(&self.workers) {
            return Err(ConfigError::InvalidWorkers {
                value: self.workers,
            });
        }
        for (field, value) in [
            ("fetch_timeout", self.fetch_timeout),
            ("page_load_timeout", self.page_load_timeout),
            ("cooldown_tick", self.cooldown_tick),
        ] {
            if value.is_zero() {
                return Err(ConfigError::Zero { field });
            }
        }
        if self.max_scroll_attempts == 0 {
            return Err(ConfigError::Zero {
                field: "max_scroll_attempts",
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn crawl_settings(&self) -> CrawlSettings {
        CrawlSettings {
            page_load_timeout: self.page_load_timeout,
            scroll_settle: self.scroll_settle,
            page_pause: self.page_pause,
            max_scroll_attempts: self.max_scroll_attempts,
        }
    }

    #[must_use]
    pub fn resolver_timing(&self) -> ResolverTiming {
        ResolverTiming {
            settle: self.resolver_settle,
            original_settle: self.original_settle,
        }
    }

    /// Settings with every wait shortened for tests and local fixtures.
    #[must_use]
    pub fn without_delays() -> Self {
        Self {
            scroll_settle: Duration::ZERO,
            page_pause: Duration::ZERO,
            resolver_settle: Duration::ZERO,
            original_settle: Duration::ZERO,
            page_load_timeout: Duration::from_millis(200),
            cooldown: Duration::from_millis(50),
            cooldown_tick: Duration::from_millis(10),
            ..Self::default()
        }
    }
}
