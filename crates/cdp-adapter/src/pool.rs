//! Bounded page pool.
//!
//! A single task runs sequentially, but callers that run several tasks at
//! once share one browser. Each open page holds a semaphore permit until it
//! is dropped, so at most `max_pages` pages exist at any time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;
use uitest_core_types::{ElementInfo, PageFacts};

use crate::driver::{BrowserDriver, CaptureTarget, PageHandle};
use crate::error::{AdapterError, AdapterErrorKind};

#[derive(Clone)]
pub struct DriverPool {
    driver: Arc<dyn BrowserDriver>,
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl DriverPool {
    pub fn new(driver: Arc<dyn BrowserDriver>, max_pages: usize) -> Self {
        let capacity = max_pages.max(1);
        Self {
            driver,
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pages that could be opened right now without waiting.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Stop handing out pages; pending and future `open` calls fail.
    pub fn close(&self) {
        self.permits.close();
    }
}

#[async_trait]
impl BrowserDriver for DriverPool {
    async fn open(&self, url: &str, deadline: Duration) -> Result<Box<dyn PageHandle>, AdapterError> {
        let permit = tokio::time::timeout(deadline, Arc::clone(&self.permits).acquire_owned())
            .await
            .map_err(|_| {
                AdapterError::new(AdapterErrorKind::NavTimeout)
                    .with_hint(format!("waiting for a free page slot for {url}"))
                    .retriable(true)
            })?
            .map_err(|_| AdapterError::new(AdapterErrorKind::PoolClosed))?;
        debug!(target: "cdp-adapter", %url, available = self.available(), "page slot acquired");

        let inner = self.driver.open(url, deadline).await?;
        Ok(Box::new(PooledPage {
            inner,
            _permit: permit,
        }))
    }

    fn default_deadline(&self) -> Duration {
        self.driver.default_deadline()
    }
}

/// Page that returns its slot to the pool when dropped.
struct PooledPage {
    inner: Box<dyn PageHandle>,
    _permit: OwnedSemaphorePermit,
}

#[async_trait]
impl PageHandle for PooledPage {
    fn url(&self) -> &str {
        self.inner.url()
    }

    async fn title(&self) -> Result<Option<String>, AdapterError> {
        self.inner.title().await
    }

    async fn interactive_elements(&self) -> Result<Vec<ElementInfo>, AdapterError> {
        self.inner.interactive_elements().await
    }

    async fn page_facts(&self) -> Result<PageFacts, AdapterError> {
        self.inner.page_facts().await
    }

    async fn count_matches(&self, selector: &str) -> Result<usize, AdapterError> {
        self.inner.count_matches(selector).await
    }

    async fn screenshot(&self, target: &CaptureTarget) -> Result<Vec<u8>, AdapterError> {
        self.inner.screenshot(target).await
    }

    async fn close(&self) -> Result<(), AdapterError> {
        self.inner.close().await
    }
}
