//! Browser session abstraction used by the crawler and the resolver.
//!
//! [`PageDriver`] is the only way the rest of the crate touches a page:
//! navigate, query elements, run a script, read the source, and open or close
//! one auxiliary tab. [`ChromeDriver`] implements it over chromiumoxide; tests
//! implement it over scripted in-memory pages.

mod chrome;
mod error;

pub use chrome::{CHROMIUM_PATH_ENV, ChromeDriver, ChromeOptions};
pub use error::DriverError;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::Instant;

/// Interval between selector checks in [`PageDriver::wait_for`].
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Script returning the current document height.
pub const PAGE_HEIGHT_SCRIPT: &str = "document.body.scrollHeight";

/// Script scrolling the window to the bottom of the document.
pub const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Read-only copy of one matched element.
///
/// `href` and `src` hold the resolved (absolute) URL the way the DOM
/// properties report them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ElementSnapshot {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl ElementSnapshot {
    /// Value of attribute `name`, if present.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// One controllable browser session with a main page and at most one
/// auxiliary tab.
///
/// While the auxiliary tab is open every call operates on it; closing it
/// returns control to the main page.
#[async_trait]
pub trait PageDriver: Send {
    /// Loads `url` in the active page and waits for the navigation to finish.
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// Snapshots every element matching a CSS selector, in document order.
    async fn find_all(&mut self, selector: &str) -> Result<Vec<ElementSnapshot>, DriverError>;

    /// Runs a JavaScript expression and returns its JSON value (`null` when
    /// the expression yields nothing).
    async fn eval_script(&mut self, script: &str) -> Result<serde_json::Value, DriverError>;

    /// Full HTML of the active page.
    async fn page_source(&mut self) -> Result<String, DriverError>;

    /// Opens `url` in a new auxiliary tab and makes it active.
    async fn open_tab(&mut self, url: &str) -> Result<(), DriverError>;

    /// Closes the auxiliary tab, if any, and returns to the main page.
    async fn close_tab(&mut self) -> Result<(), DriverError>;

    /// First element matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NotFound`] when nothing matches.
    async fn find(&mut self, selector: &str) -> Result<ElementSnapshot, DriverError> {
        self.find_all(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::not_found(selector))
    }

    /// Polls until `selector` matches at least one element.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Timeout`] if nothing matched within `timeout`.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.find_all(selector).await?.is_empty() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(DriverError::timeout(selector, timeout));
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    /// Current document height in pixels.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    async fn page_height(&mut self) -> Result<u64, DriverError> {
        let value = self.eval_script(PAGE_HEIGHT_SCRIPT).await?;
        Ok(value
            .as_u64()
            .or_else(|| value.as_f64().map(|h| h.max(0.0) as u64))
            .unwrap_or(0))
    }

    /// Scrolls the active page to its current bottom.
    async fn scroll_to_bottom(&mut self) -> Result<(), DriverError> {
        self.eval_script(SCROLL_TO_BOTTOM_SCRIPT).await?;
        Ok(())
    }
}
