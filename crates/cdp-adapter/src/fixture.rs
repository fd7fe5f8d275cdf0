//! In-memory driver serving canned pages.
//!
//! Used by the test suites of every page-facing crate and by the CLI's
//! `--fixture` dry-run mode. Pages can be swapped while the driver is shared,
//! which lets tests model a page that changes between two runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uitest_core_types::{ElementInfo, PageFacts};

use crate::driver::{BrowserDriver, CaptureTarget, PageHandle};
use crate::error::{AdapterError, AdapterErrorKind};
use crate::selector::SelectorQuery;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixturePage {
    pub title: Option<String>,
    pub elements: Vec<ElementInfo>,
    pub facts: PageFacts,
    /// PNG loaded into `screenshot` by [`FixtureDriver::from_json_file`],
    /// relative to the fixture file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_file: Option<PathBuf>,
    /// PNG bytes returned for viewport and full-page captures.
    #[serde(skip)]
    pub screenshot: Vec<u8>,
    /// PNG bytes per element selector.
    #[serde(skip)]
    pub element_screenshots: HashMap<String, Vec<u8>>,
}

impl FixturePage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Append an element; its `index` is reassigned to DOM order.
    pub fn with_element(mut self, mut element: ElementInfo) -> Self {
        element.index = self.elements.len();
        self.elements.push(element);
        self
    }

    pub fn with_elements(self, elements: impl IntoIterator<Item = ElementInfo>) -> Self {
        elements.into_iter().fold(self, FixturePage::with_element)
    }

    pub fn with_facts(mut self, facts: PageFacts) -> Self {
        self.facts = facts;
        self
    }

    pub fn with_screenshot(mut self, png: Vec<u8>) -> Self {
        self.screenshot = png;
        self
    }

    pub fn with_element_screenshot(mut self, selector: impl Into<String>, png: Vec<u8>) -> Self {
        self.element_screenshots.insert(selector.into(), png);
        self
    }
}

#[derive(Clone, Default)]
pub struct FixtureDriver {
    pages: Arc<RwLock<HashMap<String, FixturePage>>>,
    failure: Arc<RwLock<Option<AdapterErrorKind>>>,
    latency: Arc<RwLock<Duration>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl FixtureDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: impl Into<String>, page: FixturePage) -> Self {
        self.set_page(url, page);
        self
    }

    /// Load pages from a JSON object keyed by URL.
    pub fn from_json_file(path: &Path) -> Result<Self, AdapterError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal).with_hint(format!("{}: {err}", path.display()))
        })?;
        let pages: HashMap<String, FixturePage> = serde_json::from_str(&raw).map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal).with_hint(format!("{}: {err}", path.display()))
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let driver = Self::new();
        for (url, mut page) in pages {
            if let Some(file) = &page.screenshot_file {
                let file = base.join(file);
                page.screenshot = std::fs::read(&file).map_err(|err| {
                    AdapterError::new(AdapterErrorKind::Internal).with_hint(format!("{}: {err}", file.display()))
                })?;
            }
            driver.set_page(url, page.reindexed());
        }
        Ok(driver)
    }

    /// Replace (or add) the page served for `url`.
    pub fn set_page(&self, url: impl Into<String>, page: FixturePage) {
        self.pages.write().insert(url.into(), page);
    }

    /// Every subsequent `open` fails with `kind`; `None` restores normal serving.
    pub fn fail_with(&self, kind: Option<AdapterErrorKind>) {
        *self.failure.write() = kind;
    }

    /// Simulated navigation time; exceeding the deadline yields a timeout.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.write() = latency;
    }

    pub fn opened_count(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::Relaxed)
    }
}

impl FixturePage {
    fn reindexed(mut self) -> Self {
        for (index, element) in self.elements.iter_mut().enumerate() {
            element.index = index;
        }
        self
    }
}

#[async_trait]
impl BrowserDriver for FixtureDriver {
    async fn open(&self, url: &str, deadline: Duration) -> Result<Box<dyn PageHandle>, AdapterError> {
        if let Some(kind) = *self.failure.read() {
            return Err(AdapterError::new(kind).with_hint(url.to_string()));
        }

        let latency = *self.latency.read();
        if latency > deadline {
            tokio::time::sleep(deadline).await;
            return Err(AdapterError::new(AdapterErrorKind::NavTimeout)
                .with_hint(format!("{url} after {}ms", deadline.as_millis()))
                .retriable(true));
        }
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let page = self.pages.read().get(url).cloned().ok_or_else(|| {
            AdapterError::new(AdapterErrorKind::NavFailed).with_hint(format!("no fixture page for {url}"))
        })?;
        self.opened.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(FixtureHandle {
            url: url.to_string(),
            page,
            closed: Arc::clone(&self.closed),
        }))
    }
}

struct FixtureHandle {
    url: String,
    page: FixturePage,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl PageHandle for FixtureHandle {
    fn url(&self) -> &str {
        &self.url
    }

    async fn title(&self) -> Result<Option<String>, AdapterError> {
        Ok(self.page.title.clone())
    }

    async fn interactive_elements(&self) -> Result<Vec<ElementInfo>, AdapterError> {
        Ok(self.page.elements.clone())
    }

    async fn page_facts(&self) -> Result<PageFacts, AdapterError> {
        Ok(self.page.facts.clone())
    }

    async fn count_matches(&self, selector: &str) -> Result<usize, AdapterError> {
        let query = SelectorQuery::parse(selector);
        Ok(self
            .page
            .elements
            .iter()
            .filter(|element| query.matches(element))
            .count())
    }

    async fn screenshot(&self, target: &CaptureTarget) -> Result<Vec<u8>, AdapterError> {
        let bytes = match target {
            CaptureTarget::Viewport | CaptureTarget::FullPage => Some(&self.page.screenshot),
            CaptureTarget::Element(selector) => {
                if self.count_matches(selector).await? == 0 {
                    return Err(AdapterError::new(AdapterErrorKind::TargetNotFound).with_hint(selector.clone()));
                }
                self.page
                    .element_screenshots
                    .get(selector)
                    .or(Some(&self.page.screenshot))
            }
        };
        match bytes {
            Some(bytes) if !bytes.is_empty() => Ok(bytes.clone()),
            _ => Err(AdapterError::new(AdapterErrorKind::ScriptFailed)
                .with_hint(format!("fixture page {} has no screenshot", self.url))),
        }
    }

    async fn close(&self) -> Result<(), AdapterError> {
        self.closed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
