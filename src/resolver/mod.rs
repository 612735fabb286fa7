//! Resolves an album item's detail page to its largest downloadable asset.
//!
//! The resolver opens the item's `sizes/5k/` page in an auxiliary tab; the
//! service redirects to the largest size that actually exists. The asset
//! element's `src` is read and classified by its size suffix. When the page has
//! no asset element, the explicit original-size link is followed instead.
//!
//! Every failure yields `None`: the item is skipped, nothing is recorded.

mod tier;

pub use tier::{ORIGINAL_LABEL, classify_asset_url, normalize_asset_url, tier_label};

use std::time::Duration;

use tracing::{debug, instrument, warn};
use url::Url;

use crate::browser::PageDriver;
use crate::item::PhotoId;

/// Origin used when the detail URL has none (relative links).
pub const DEFAULT_ORIGIN: &str = "https://www.flickr.com";

/// Asset element on a sizes page.
pub const ASSET_SELECTOR: &str = "#allsizes-photo img";

/// Link to the original-size page in the sizes menu.
pub const ORIGINAL_LINK_SELECTOR: &str = "a[href*='/sizes/o/']";

/// Best asset found for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub url: String,
    /// Size tier, `None` when the URL carried no size suffix.
    pub label: Option<String>,
}

/// Waits applied while resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverTiming {
    /// After opening the sizes page (redirects settle).
    pub settle: Duration,
    /// After following the original-size link.
    pub original_settle: Duration,
}

impl Default for ResolverTiming {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(1500),
            original_settle: Duration::from_secs(1),
        }
    }
}

/// Detail-page to asset-URL resolver driving a [`PageDriver`].
#[derive(Debug, Clone, Default)]
pub struct SizeResolver {
    timing: ResolverTiming,
}

impl SizeResolver {
    #[must_use]
    pub fn new(timing: ResolverTiming) -> Self {
        Self { timing }
    }

    /// Resolves `detail_url` to its best asset.
    ///
    /// The auxiliary tab is closed before returning, whatever the outcome.
    #[instrument(level = "debug", skip(self, driver))]
    pub async fn resolve<D>(&self, driver: &mut D, detail_url: &str) -> Option<ResolvedAsset>
    where
        D: PageDriver + ?Sized,
    {
        let Some(photo) = PhotoId::from_detail_url(detail_url) else {
            debug!("detail URL has no photo id");
            return None;
        };
        let sizes_url = sizes_page_url(detail_url, &photo);

        let resolved = match driver.open_tab(&sizes_url).await {
            Ok(()) => self.read_best_asset(driver).await,
            Err(e) => {
                warn!(url = %sizes_url, error = %e, "could not open sizes page");
                None
            }
        };

        if let Err(e) = driver.close_tab().await {
            warn!(error = %e, "could not close sizes tab");
        }

        match &resolved {
            Some(asset) => debug!(url = %asset.url, label = ?asset.label, "resolved asset"),
            None => debug!("no asset found"),
        }
        resolved
    }

    async fn read_best_asset<D>(&self, driver: &mut D) -> Option<ResolvedAsset>
    where
        D: PageDriver + ?Sized,
    {
        tokio::time::sleep(self.timing.settle).await;

        if let Some(src) = asset_src(driver).await {
            return Some(ResolvedAsset {
                label: classify_asset_url(&src),
                url: normalize_asset_url(&src),
            });
        }

        let link = driver.find(ORIGINAL_LINK_SELECTOR).await.ok()?;
        let href = link.attr("href").filter(|h| !h.is_empty())?.to_string();
        if let Err(e) = driver.navigate(&href).await {
            debug!(url = %href, error = %e, "original-size page failed to load");
            return None;
        }
        tokio::time::sleep(self.timing.original_settle).await;

        let src = asset_src(driver).await?;
        Some(ResolvedAsset {
            url: normalize_asset_url(&src),
            label: Some(ORIGINAL_LABEL.to_string()),
        })
    }
}

async fn asset_src<D>(driver: &mut D) -> Option<String>
where
    D: PageDriver + ?Sized,
{
    match driver.find(ASSET_SELECTOR).await {
        Ok(element) => element
            .attr("src")
            .filter(|src| !src.is_empty())
            .map(str::to_string),
        Err(e) => {
            debug!(error = %e, "asset element not available");
            None
        }
    }
}

/// URL of the largest-size page for `photo`, on the detail URL's origin.
#[must_use]
pub fn sizes_page_url(detail_url: &str, photo: &PhotoId) -> String {
    let origin = Url::parse(detail_url)
        .ok()
        .map(|u| u.origin())
        .filter(url::Origin::is_tuple)
        .map_or_else(|| DEFAULT_ORIGIN.to_string(), |o| o.ascii_serialization());
    format!("{origin}/photos/{}/{}/sizes/5k/", photo.owner, photo.id)
}
