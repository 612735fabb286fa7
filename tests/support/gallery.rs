//! Scripted single-page album served through [`PageDriver`].
//!
//! The album page lists one card per photo. Each photo's sizes page shows the
//! asset URL it was built with, or nothing when the photo has no asset.

use std::collections::HashMap;

use album_downloader::browser::{DriverError, ElementSnapshot, PAGE_HEIGHT_SCRIPT, PageDriver};
use album_downloader::crawler::{CARD_LINK_SELECTOR, GALLERY_IMAGE_SELECTOR};
use album_downloader::resolver::ASSET_SELECTOR;
use async_trait::async_trait;

pub const ALBUM_URL: &str = "https://www.flickr.com/photos/owner/albums/72177720330390070";

type Page = HashMap<&'static str, Vec<ElementSnapshot>>;

fn element(text: &str, attributes: &[(&str, &str)]) -> ElementSnapshot {
    ElementSnapshot {
        text: text.to_string(),
        attributes: attributes
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
    }
}

#[derive(Debug, Default)]
pub struct GalleryDriver {
    pages: HashMap<String, Page>,
    main: Page,
    aux: Option<Page>,
    pub sizes_pages_opened: usize,
}

impl GalleryDriver {
    pub fn new() -> Self {
        let mut driver = Self::default();
        driver.pages.insert(ALBUM_URL.to_string(), Page::new());
        driver
    }

    /// Adds a card to the album. `asset_url` is what its sizes page shows.
    pub fn photo(mut self, title: &str, id: &str, asset_url: Option<&str>) -> Self {
        let detail = format!("https://www.flickr.com/photos/owner/{id}/in/album-72177720330390070/");
        let album = self.pages.entry(ALBUM_URL.to_string()).or_default();
        album.entry(GALLERY_IMAGE_SELECTOR).or_default().push(element(
            "",
            &[("src", "https://live.staticflickr.com/65535/thumb_m.jpg")],
        ));
        album
            .entry(CARD_LINK_SELECTOR)
            .or_default()
            .push(element("", &[("title", title), ("href", detail.as_str())]));

        let mut sizes = Page::new();
        if let Some(src) = asset_url {
            sizes.insert(ASSET_SELECTOR, vec![element("", &[("src", src)])]);
        }
        self.pages.insert(
            format!("https://www.flickr.com/photos/owner/{id}/sizes/5k/"),
            sizes,
        );
        self
    }

    fn active(&mut self) -> &mut Page {
        self.aux.as_mut().unwrap_or(&mut self.main)
    }
}

#[async_trait]
impl PageDriver for GalleryDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        let page = self.pages.get(url).cloned().unwrap_or_default();
        *self.active() = page;
        Ok(())
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<ElementSnapshot>, DriverError> {
        Ok(self.active().get(selector).cloned().unwrap_or_default())
    }

    async fn eval_script(&mut self, script: &str) -> Result<serde_json::Value, DriverError> {
        if script == PAGE_HEIGHT_SCRIPT {
            return Ok(serde_json::json!(1000));
        }
        Ok(serde_json::Value::Null)
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        Ok(String::new())
    }

    async fn open_tab(&mut self, url: &str) -> Result<(), DriverError> {
        self.sizes_pages_opened += 1;
        self.aux = Some(self.pages.get(url).cloned().unwrap_or_default());
        Ok(())
    }

    async fn close_tab(&mut self) -> Result<(), DriverError> {
        self.aux = None;
        Ok(())
    }
}
