//! Scrolls an album page until lazy loading stops producing items.

use std::time::Duration;

use tracing::debug;

use crate::browser::{DriverError, PageDriver};

/// Consecutive scrolls without progress after which a page counts as loaded.
pub const STAGNANT_SCROLL_LIMIT: usize = 3;

/// Selector for the gallery's rendered thumbnails.
pub const GALLERY_IMAGE_SELECTOR: &str = "img[src*='staticflickr.com']";

/// Summary of one scroll pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    pub images: usize,
    pub attempts: usize,
}

/// Scrolls to the bottom repeatedly until three consecutive attempts load no
/// new images and leave the page height unchanged, or `max_attempts` is hit.
///
/// # Errors
///
/// Returns the first driver error; the page is then used as far as it loaded.
pub async fn scroll_to_load_all<D>(
    driver: &mut D,
    settle: Duration,
    max_attempts: usize,
) -> Result<ScrollOutcome, DriverError>
where
    D: PageDriver + ?Sized,
{
    let mut images = driver.find_all(GALLERY_IMAGE_SELECTOR).await?.len();
    let mut height = driver.page_height().await?;
    let mut stagnant = 0;
    let mut attempts = 0;

    while stagnant < STAGNANT_SCROLL_LIMIT && attempts < max_attempts {
        attempts += 1;
        driver.scroll_to_bottom().await?;
        tokio::time::sleep(settle).await;

        let current_images = driver.find_all(GALLERY_IMAGE_SELECTOR).await?.len();
        let current_height = driver.page_height().await?;
        if current_images > images || current_height > height {
            stagnant = 0;
        } else {
            stagnant += 1;
        }
        images = images.max(current_images);
        height = height.max(current_height);
    }

    debug!(images, attempts, "finished scrolling page");
    Ok(ScrollOutcome { images, attempts })
}
