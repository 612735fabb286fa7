//! Page-count and photo-count discovery for an album.
//!
//! The album header is not reliable, so the page count comes from a cascade of
//! heuristics over the first page. The first heuristic that yields more than
//! one page wins; when none does, the album has a single page.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::browser::PageDriver;

/// Items the service shows per album page.
pub const PHOTOS_PER_PAGE: usize = 100;

/// Selectors for pagination links, tried in order.
pub const PAGINATION_LINK_SELECTORS: [&str; 4] = [
    ".pagination-view a[href*='page']",
    "a[href*='/page']",
    ".pagination a[href*='page']",
    "[class*='pagination'] a[href*='page']",
];

/// Container whose text may read `1 of 4`.
pub const PAGINATION_VIEW_SELECTOR: &str = ".pagination-view";

/// Elements whose text may hold the album's item count.
pub const COUNT_ELEMENT_SELECTOR: &str = "[class*='count'], [class*='total'], .album-info";

/// Header element holding `N photos`.
pub const PHOTO_COUNT_SELECTOR: &str = ".stat.photo-count";

#[allow(clippy::expect_used)]
static PAGE_IN_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/page(\d+)").expect("page href regex is valid"));

#[allow(clippy::expect_used)]
static PAGE_INDICATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:of|z)\s*(\d+)").expect("page indicator regex is valid")
});

#[allow(clippy::expect_used)]
static COUNT_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:photos|zdjęć|elementów|items)").expect("count text regex is valid")
});

#[allow(clippy::expect_used)]
static COUNT_IN_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:photos|items|zdjęć)").expect("count source regex is valid")
});

#[allow(clippy::expect_used)]
static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)").expect("number regex is valid"));

#[allow(clippy::expect_used)]
static PHOTOS_IN_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*photos").expect("photos in source regex is valid")
});

/// Pages needed for `photos` items, at least one.
#[must_use]
pub fn pages_for_photo_count(photos: usize) -> usize {
    photos.div_ceil(PHOTOS_PER_PAGE).max(1)
}

/// Highest `/pageN` in the given link targets, or 1.
#[must_use]
pub fn max_page_from_hrefs<'a>(hrefs: impl IntoIterator<Item = &'a str>) -> usize {
    hrefs
        .into_iter()
        .filter_map(|href| PAGE_IN_HREF.captures(href))
        .filter_map(|c| c[1].parse::<usize>().ok())
        .fold(1, usize::max)
}

/// Total from an indicator such as `1 of 4` or `Strona 1 z 4`.
#[must_use]
pub fn pages_from_indicator(text: &str) -> Option<usize> {
    PAGE_INDICATOR
        .captures(text)
        .and_then(|c| c[2].parse().ok())
}

/// Page count from a text like `347 photos`.
#[must_use]
pub fn pages_from_count_text(text: &str) -> Option<usize> {
    COUNT_IN_TEXT
        .captures(text)
        .and_then(|c| c[1].parse::<usize>().ok())
        .map(pages_for_photo_count)
}

/// Page count from the first item count above one page found in the page source.
#[must_use]
pub fn pages_from_source(source: &str) -> Option<usize> {
    COUNT_IN_SOURCE
        .captures_iter(source)
        .filter_map(|c| c[1].parse::<usize>().ok())
        .find(|count| *count > PHOTOS_PER_PAGE)
        .map(pages_for_photo_count)
}

/// Item count from the album header text (`257 photos`).
#[must_use]
pub fn photo_count_from_text(text: &str) -> Option<usize> {
    FIRST_NUMBER
        .captures(text.trim())
        .and_then(|c| c[1].parse().ok())
}

/// Item count from the first `N photos` in the page source.
#[must_use]
pub fn photo_count_from_source(source: &str) -> Option<usize> {
    PHOTOS_IN_SOURCE
        .captures(source)
        .and_then(|c| c[1].parse().ok())
}

/// Runs the page-count cascade against the currently loaded first page.
///
/// Driver errors only disable the heuristic that hit them.
pub async fn detect_total_pages<D>(driver: &mut D) -> usize
where
    D: PageDriver + ?Sized,
{
    for selector in PAGINATION_LINK_SELECTORS {
        let Ok(links) = driver.find_all(selector).await else {
            continue;
        };
        let pages = max_page_from_hrefs(links.iter().filter_map(|l| l.attr("href")));
        if pages > 1 {
            debug!(selector, pages, "page count from pagination links");
            return pages;
        }
    }

    if let Ok(view) = driver.find(PAGINATION_VIEW_SELECTOR).await {
        if let Some(pages) = pages_from_indicator(&view.text).filter(|p| *p > 1) {
            debug!(pages, "page count from pagination indicator");
            return pages;
        }
    }

    if let Ok(elements) = driver.find_all(COUNT_ELEMENT_SELECTOR).await {
        if let Some(pages) = elements
            .iter()
            .find_map(|e| pages_from_count_text(&e.text))
            .filter(|p| *p > 1)
        {
            info!(pages, "page count from album item count");
            return pages;
        }
    }

    if let Ok(source) = driver.page_source().await {
        if let Some(pages) = pages_from_source(&source).filter(|p| *p > 1) {
            info!(pages, "page count estimated from page source");
            return pages;
        }
    }

    1
}

/// Reads the album's item count from the loaded first page, if shown.
pub async fn detect_photo_count<D>(driver: &mut D) -> Option<usize>
where
    D: PageDriver + ?Sized,
{
    if let Ok(header) = driver.find(PHOTO_COUNT_SELECTOR).await {
        if let Some(count) = photo_count_from_text(&header.text) {
            return Some(count);
        }
    }
    let source = driver.page_source().await.ok()?;
    photo_count_from_source(&source)
}
