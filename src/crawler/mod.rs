//! Album crawler: walks every album page, loads lazy content, and turns each
//! gallery card into a queued [`DownloadTask`].
//!
//! The crawler is the single producer. It owns the page driver for the whole
//! run and processes cards strictly in page order. Per card, the cheapest
//! source wins: a valid file on disk, then the known-URL log, then a live
//! resolution through the sizes page.

pub mod pagination;
pub mod scroll;

pub use pagination::{
    PHOTOS_PER_PAGE, detect_photo_count, detect_total_pages, pages_for_photo_count,
    pages_from_count_text, pages_from_indicator, pages_from_source,
};
pub use scroll::{GALLERY_IMAGE_SELECTOR, STAGNANT_SCROLL_LIMIT, ScrollOutcome, scroll_to_load_all};

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::browser::{DriverError, PageDriver};
use crate::download::{DownloadState, WorkQueue};
use crate::item::{AlbumItem, DownloadTask};
use crate::progress::ProgressObserver;
use crate::resolver::SizeResolver;
use crate::store::{MetadataStore, UNKNOWN_RESOLUTION};

/// Links from gallery cards to item detail pages.
pub const CARD_LINK_SELECTOR: &str = ".photo-card a.photo-link";

/// Errors that end a crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The first album page could not be loaded or never showed a gallery.
    #[error("album {url} is unreachable: {source}")]
    AlbumUnreachable {
        url: String,
        #[source]
        source: DriverError,
    },
}

/// Timings and bounds for one crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSettings {
    pub page_load_timeout: Duration,
    pub scroll_settle: Duration,
    pub page_pause: Duration,
    pub max_scroll_attempts: usize,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            page_load_timeout: Duration::from_secs(10),
            scroll_settle: Duration::from_millis(1500),
            page_pause: Duration::from_millis(500),
            max_scroll_attempts: 200,
        }
    }
}

/// Counters for what the crawler saw, independent of download outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub total_pages: usize,
    /// Pages skipped because they failed to load.
    pub pages_skipped: usize,
    pub cards: usize,
    /// Tasks pushed onto the queue (cached and freshly resolved).
    pub queued: usize,
    pub resolved: usize,
    /// Cards whose asset could not be resolved.
    pub unresolved: usize,
    /// Resolved URLs already recorded for another card.
    pub duplicate_urls: usize,
}

/// Shared state the crawler writes into while walking the album.
pub struct CrawlSinks<'a> {
    pub metadata: &'a mut MetadataStore,
    pub state: &'a DownloadState,
    pub queue: &'a WorkQueue,
    pub progress: &'a dyn ProgressObserver,
}

/// Sequential album walker.
#[derive(Debug, Clone, Default)]
pub struct AlbumCrawler {
    settings: CrawlSettings,
    resolver: SizeResolver,
    next_sequence: u64,
}

impl AlbumCrawler {
    #[must_use]
    pub fn new(settings: CrawlSettings, resolver: SizeResolver) -> Self {
        Self {
            settings,
            resolver,
            next_sequence: 0,
        }
    }

    /// Crawls every page of the album at `album_url`.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::AlbumUnreachable`] when the first page fails to
    /// load or shows no gallery in time. Later pages that fail are skipped.
    #[instrument(level = "info", skip(self, driver, sinks))]
    pub async fn crawl<D>(
        &mut self,
        driver: &mut D,
        album_url: &str,
        sinks: &mut CrawlSinks<'_>,
    ) -> Result<CrawlReport, CrawlError>
    where
        D: PageDriver + ?Sized,
    {
        let root = album_url.trim_end_matches('/');
        let mut report = CrawlReport::default();

        self.load_page(driver, root)
            .await
            .map_err(|source| CrawlError::AlbumUnreachable {
                url: root.to_string(),
                source,
            })?;

        if let Some(photos) = detect_photo_count(driver).await {
            info!(photos, "album size");
            sinks.progress.album_total(photos);
        }
        report.total_pages = detect_total_pages(driver).await;
        info!(pages = report.total_pages, "album pages detected");

        for page in 1..=report.total_pages {
            if page > 1 {
                let url = page_url(root, page);
                if let Err(e) = self.load_page(driver, &url).await {
                    warn!(page, error = %e, "page failed to load, skipping");
                    report.pages_skipped += 1;
                    continue;
                }
            }

            self.process_page(driver, page, sinks, &mut report).await;

            if page < report.total_pages {
                tokio::time::sleep(self.settings.page_pause).await;
            }
        }

        info!(
            cards = report.cards,
            queued = report.queued,
            unresolved = report.unresolved,
            "crawl finished"
        );
        Ok(report)
    }

    async fn load_page<D>(&self, driver: &mut D, url: &str) -> Result<(), DriverError>
    where
        D: PageDriver + ?Sized,
    {
        driver.navigate(url).await?;
        driver
            .wait_for(GALLERY_IMAGE_SELECTOR, self.settings.page_load_timeout)
            .await
    }

    async fn process_page<D>(
        &mut self,
        driver: &mut D,
        page: usize,
        sinks: &mut CrawlSinks<'_>,
        report: &mut CrawlReport,
    ) where
        D: PageDriver + ?Sized,
    {
        match scroll_to_load_all(
            driver,
            self.settings.scroll_settle,
            self.settings.max_scroll_attempts,
        )
        .await
        {
            Ok(outcome) => debug!(page, images = outcome.images, "page loaded"),
            Err(e) => warn!(page, error = %e, "scrolling stopped early"),
        }

        let items = match extract_items(driver).await {
            Ok(items) => items,
            Err(e) => {
                warn!(page, error = %e, "could not read gallery cards");
                return;
            }
        };
        info!(page, cards = items.len(), "processing page");
        report.cards += items.len();

        for item in items {
            self.process_item(driver, &item, sinks, report).await;
        }
    }

    async fn process_item<D>(
        &mut self,
        driver: &mut D,
        item: &AlbumItem,
        sinks: &mut CrawlSinks<'_>,
        report: &mut CrawlReport,
    ) where
        D: PageDriver + ?Sized,
    {
        if sinks.state.is_already_downloaded(&item.filename) {
            sinks.state.record_skipped_scan();
            sinks.progress.skipped_during_scan(&item.filename);
            debug!(filename = %item.filename, "already on disk");
            return;
        }

        if let Some(known) = sinks.metadata.get(&item.filename) {
            let task = DownloadTask::new(known.url.clone(), &item.filename, self.sequence());
            sinks.state.record_from_cache();
            sinks.queue.push(task);
            report.queued += 1;
            debug!(filename = %item.filename, "queued from known URLs");
            return;
        }

        let Some(asset) = self.resolver.resolve(driver, &item.detail_url).await else {
            report.unresolved += 1;
            debug!(filename = %item.filename, "no asset resolved, skipping");
            return;
        };
        report.resolved += 1;

        if sinks.metadata.has_seen_url(&asset.url) {
            report.duplicate_urls += 1;
            debug!(url = %asset.url, "asset URL already recorded");
            return;
        }

        let label = asset.label.as_deref().unwrap_or(UNKNOWN_RESOLUTION);
        if let Err(e) = sinks
            .metadata
            .append_record(&item.filename, &asset.url, &item.title, label)
        {
            warn!(filename = %item.filename, error = %e, "could not record resolved URL, skipping");
            return;
        }

        sinks
            .queue
            .push(DownloadTask::new(asset.url, &item.filename, self.sequence()));
        report.queued += 1;
    }

    fn sequence(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }
}

/// URL of album page `page` (1-based) under `root`.
#[must_use]
pub fn page_url(root: &str, page: usize) -> String {
    let root = root.trim_end_matches('/');
    if page <= 1 {
        root.to_string()
    } else {
        format!("{root}/page{page}")
    }
}

/// Reads every gallery card on the loaded page.
///
/// Cards without a title, a link, or a photo id in the link are dropped.
///
/// # Errors
///
/// Returns the driver error if the cards cannot be queried.
pub async fn extract_items<D>(driver: &mut D) -> Result<Vec<AlbumItem>, DriverError>
where
    D: PageDriver + ?Sized,
{
    let cards = driver.find_all(CARD_LINK_SELECTOR).await?;
    Ok(cards
        .iter()
        .filter_map(|card| {
            let title = card.attr("title").filter(|t| !t.is_empty())?;
            let href = card.attr("href").filter(|h| !h.is_empty())?;
            let item = AlbumItem::from_card(title, href);
            if item.is_none() {
                debug!(href, "card link has no photo id");
            }
            item
        })
        .collect())
}
