//! In-memory [`PageDriver`] serving scripted pages keyed by URL.
//!
//! Selectors are matched by exact string, so a page answers only the selectors
//! it was built with. Scrolling reveals the next lazy batch, if any, and makes
//! the page taller.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;

use crate::browser::{
    DriverError, ElementSnapshot, PAGE_HEIGHT_SCRIPT, PageDriver, SCROLL_TO_BOTTOM_SCRIPT,
};

/// Builds an element snapshot from text and attribute pairs.
pub fn element(text: &str, attributes: &[(&str, &str)]) -> ElementSnapshot {
    ElementSnapshot {
        text: text.to_string(),
        attributes: attributes
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    elements: HashMap<String, Vec<ElementSnapshot>>,
    lazy: VecDeque<Vec<(String, ElementSnapshot)>>,
    source: String,
    height: u64,
    shrink: u64,
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            height: 1000,
            ..Self::default()
        }
    }

    pub fn with(mut self, selector: &str, element: ElementSnapshot) -> Self {
        self.elements
            .entry(selector.to_string())
            .or_default()
            .push(element);
        self
    }

    /// Elements that appear only after one more scroll.
    pub fn with_lazy(mut self, batch: Vec<(&str, ElementSnapshot)>) -> Self {
        self.lazy.push_back(
            batch
                .into_iter()
                .map(|(s, e)| (s.to_string(), e))
                .collect(),
        );
        self
    }

    /// Page loses `pixels` of height on every scroll that reveals nothing.
    pub fn shrinking_by(mut self, pixels: u64) -> Self {
        self.shrink = pixels;
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    fn scroll(&mut self) {
        if let Some(batch) = self.lazy.pop_front() {
            for (selector, element) in batch {
                self.elements.entry(selector).or_default().push(element);
            }
            self.height += 1000;
        } else {
            self.height = self.height.saturating_sub(self.shrink);
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeDriver {
    pages: HashMap<String, FakePage>,
    unreachable: HashSet<String>,
    main: FakePage,
    aux: Option<FakePage>,
    pub navigations: Vec<String>,
    pub tabs_opened: Vec<String>,
    pub tabs_closed: usize,
    pub scrolls: usize,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn unreachable(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_string());
        self
    }

    /// True if the auxiliary tab is currently open.
    pub fn has_open_tab(&self) -> bool {
        self.aux.is_some()
    }

    fn load(&self, url: &str) -> Result<FakePage, DriverError> {
        if self.unreachable.contains(url) {
            return Err(DriverError::navigation(url, "connection refused"));
        }
        Ok(self.pages.get(url).cloned().unwrap_or_default())
    }

    fn active(&mut self) -> &mut FakePage {
        self.aux.as_mut().unwrap_or(&mut self.main)
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.navigations.push(url.to_string());
        let page = self.load(url)?;
        *self.active() = page;
        Ok(())
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<ElementSnapshot>, DriverError> {
        Ok(self
            .active()
            .elements
            .get(selector)
            .cloned()
            .unwrap_or_default())
    }

    async fn eval_script(&mut self, script: &str) -> Result<serde_json::Value, DriverError> {
        match script {
            SCROLL_TO_BOTTOM_SCRIPT => {
                self.scrolls += 1;
                self.active().scroll();
                Ok(serde_json::Value::Null)
            }
            PAGE_HEIGHT_SCRIPT => Ok(serde_json::json!(self.active().height)),
            _ => Ok(serde_json::Value::Null),
        }
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        Ok(self.active().source.clone())
    }

    async fn open_tab(&mut self, url: &str) -> Result<(), DriverError> {
        self.tabs_opened.push(url.to_string());
        let page = self.load(url)?;
        self.aux = Some(page);
        Ok(())
    }

    async fn close_tab(&mut self) -> Result<(), DriverError> {
        if self.aux.take().is_some() {
            self.tabs_closed += 1;
        }
        Ok(())
    }
}
