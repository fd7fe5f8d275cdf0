use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cdp_adapter::{BrowserDriver, PageHandle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uitest_core_types::{StructuralSnapshot, Tool, ToolFailure, ToolResult};
use url::Url;

use crate::errors::PerceiverError;
use crate::flags::{accessibility_flags, structure_flags};
use crate::metrics;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    pub navigation_timeout_ms: u64,
    /// Bound for each DOM query after load.
    pub query_timeout_ms: u64,
    /// Elements beyond this many are dropped from the snapshot.
    pub max_elements: usize,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: 30_000,
            query_timeout_ms: 10_000,
            max_elements: 200,
        }
    }
}

impl InspectorConfig {
    pub fn with_navigation_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.navigation_timeout_ms = timeout_ms;
        self
    }

    pub fn with_query_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.query_timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectRequest {
    pub url: String,
}

impl InspectRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// `inspect(url) → StructuralSnapshot`.
pub struct PageInspector {
    driver: Arc<dyn BrowserDriver>,
    cfg: InspectorConfig,
}

impl PageInspector {
    pub fn new(driver: Arc<dyn BrowserDriver>) -> Self {
        Self::with_config(driver, InspectorConfig::default())
    }

    pub fn with_config(driver: Arc<dyn BrowserDriver>, cfg: InspectorConfig) -> Self {
        Self { driver, cfg }
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.cfg
    }

    pub async fn inspect(&self, url: &str) -> Result<StructuralSnapshot, PerceiverError> {
        validate_url(url)?;
        let started = Instant::now();
        let deadline = Duration::from_millis(self.cfg.navigation_timeout_ms);
        let page = self.driver.open(url, deadline).await?;

        let captured = self.capture(page.as_ref()).await;
        if let Err(err) = page.close().await {
            warn!(target: "perceiver-structural", %url, error = %err, "page close failed");
        }

        match &captured {
            Ok(snapshot) => {
                metrics::record_inspect(Some(snapshot.elements.len()), started.elapsed());
                info!(
                    target: "perceiver-structural",
                    %url,
                    elements = snapshot.elements.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "page inspected"
                );
            }
            Err(_) => metrics::record_inspect(None, started.elapsed()),
        }
        captured
    }

    async fn capture(&self, page: &dyn PageHandle) -> Result<StructuralSnapshot, PerceiverError> {
        let title = self.bounded("title", page.title()).await?;
        let mut elements = self.bounded("element scan", page.interactive_elements()).await?;
        let facts = self.bounded("page facts", page.page_facts()).await?;

        if elements.len() > self.cfg.max_elements {
            debug!(
                target: "perceiver-structural",
                found = elements.len(),
                kept = self.cfg.max_elements,
                "truncating element list"
            );
            elements.truncate(self.cfg.max_elements);
        }
        for (index, element) in elements.iter_mut().enumerate() {
            element.index = index;
        }

        Ok(StructuralSnapshot {
            url: page.url().to_string(),
            title: title.filter(|title| !title.trim().is_empty()),
            structure: structure_flags(&elements, &facts),
            accessibility: accessibility_flags(&elements, &facts),
            elements,
        })
    }

    async fn bounded<T, F>(&self, stage: &'static str, fut: F) -> Result<T, PerceiverError>
    where
        F: Future<Output = Result<T, cdp_adapter::AdapterError>>,
    {
        let timeout_ms = self.cfg.query_timeout_ms;
        match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
            Ok(result) => result.map_err(PerceiverError::from),
            Err(_) => Err(PerceiverError::Timeout { stage, timeout_ms }),
        }
    }
}

fn validate_url(raw: &str) -> Result<(), PerceiverError> {
    let parsed = Url::parse(raw.trim()).map_err(|_| PerceiverError::InvalidUrl(raw.to_string()))?;
    match parsed.scheme() {
        "http" | "https" | "file" => Ok(()),
        _ => Err(PerceiverError::InvalidUrl(raw.to_string())),
    }
}

#[async_trait]
impl Tool for PageInspector {
    type Input = InspectRequest;
    type Output = StructuralSnapshot;

    fn name(&self) -> &'static str {
        "page_inspector"
    }

    async fn call(&self, input: InspectRequest) -> ToolResult<StructuralSnapshot> {
        self.inspect(&input.url).await.map_err(ToolFailure::from)
    }
}
