//! Chromium driver over the DevTools protocol (chromiumoxide).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uitest_core_types::{ElementInfo, PageFacts};

use crate::config::CdpConfig;
use crate::driver::{BrowserDriver, CaptureTarget, PageHandle};
use crate::error::{AdapterError, AdapterErrorKind};
use crate::scripts;
use crate::selector::SelectorQuery;

struct BrowserState {
    browser: Browser,
    _handler: JoinHandle<()>,
}

/// Lazily launches one browser process and opens a fresh tab per `open`.
pub struct ChromiumDriver {
    cfg: CdpConfig,
    state: Arc<Mutex<Option<BrowserState>>>,
}

impl ChromiumDriver {
    pub fn new(cfg: CdpConfig) -> Self {
        Self {
            cfg,
            state: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &CdpConfig {
        &self.cfg
    }

    fn browser_config(&self) -> Result<BrowserConfig, AdapterError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(self.cfg.navigation_timeout())
            .window_size(self.cfg.viewport.width, self.cfg.viewport.height)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--hide-scrollbars");

        if !self.cfg.headless {
            builder = builder.with_head();
        }
        if std::env::var("UITESTGEN_DISABLE_SANDBOX")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
        {
            builder = builder.no_sandbox();
        }
        match self.cfg.resolve_executable() {
            Some(path) => builder = builder.chrome_executable(path),
            None => {
                return Err(AdapterError::new(AdapterErrorKind::Launch)
                    .with_hint("no chrome/chromium executable found; set UITESTGEN_CHROME or browser.executable"))
            }
        }

        builder.build().map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal).with_hint(format!("browser config error: {err}"))
        })
    }

    async fn new_page(&self) -> Result<Page, AdapterError> {
        let mut guard = self.state.lock().await;
        if guard.is_none() {
            let config = self.browser_config()?;
            info!(target: "cdp-adapter", headless = self.cfg.headless, "launching chromium");
            let (browser, mut handler) = Browser::launch(config).await.map_err(|err| {
                AdapterError::new(AdapterErrorKind::Launch).with_hint(err.to_string())
            })?;
            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        debug!(target: "cdp-adapter", "cdp handler loop ended");
                        break;
                    }
                }
            });
            *guard = Some(BrowserState {
                browser,
                _handler: handle,
            });
        }
        let state = guard
            .as_ref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Internal).with_hint("browser state missing"))?;
        Ok(state.browser.new_page("about:blank").await?)
    }

    /// Close the browser process if it was started.
    pub async fn shutdown(&self) {
        let mut guard = self.state.lock().await;
        if let Some(mut state) = guard.take() {
            if let Err(err) = state.browser.close().await {
                warn!(target: "cdp-adapter", error = %err, "error closing browser");
            }
            info!(target: "cdp-adapter", "chromium shut down");
        }
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn open(&self, url: &str, deadline: Duration) -> Result<Box<dyn PageHandle>, AdapterError> {
        let page = self.new_page().await?;
        debug!(target: "cdp-adapter", %url, deadline_ms = deadline.as_millis() as u64, "navigating");

        let navigation = tokio::time::timeout(deadline, page.goto(url))
            .await
            .map(|result| result.map(|_| ()));
        match navigation {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                let _ = page.close().await;
                return Err(AdapterError::new(AdapterErrorKind::NavFailed)
                    .with_hint(format!("{url}: {err}"))
                    .retriable(true));
            }
            Err(_) => {
                let _ = page.close().await;
                return Err(AdapterError::new(AdapterErrorKind::NavTimeout)
                    .with_hint(format!("{url} after {}ms", deadline.as_millis()))
                    .retriable(true));
            }
        }

        if !self.cfg.settle().is_zero() {
            tokio::time::sleep(self.cfg.settle()).await;
        }

        Ok(Box::new(ChromiumPage {
            url: url.to_string(),
            page,
        }))
    }

    fn default_deadline(&self) -> Duration {
        self.cfg.navigation_timeout()
    }
}

struct ChromiumPage {
    url: String,
    page: Page,
}

impl ChromiumPage {
    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T, AdapterError> {
        let result = self.page.evaluate(script).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::ScriptFailed).with_hint(err.to_string())
        })?;
        result.into_value::<T>().map_err(|err| {
            AdapterError::new(AdapterErrorKind::ScriptFailed).with_hint(format!("decode: {err}"))
        })
    }
}

#[async_trait]
impl PageHandle for ChromiumPage {
    fn url(&self) -> &str {
        &self.url
    }

    async fn title(&self) -> Result<Option<String>, AdapterError> {
        Ok(self.page.get_title().await?)
    }

    async fn interactive_elements(&self) -> Result<Vec<ElementInfo>, AdapterError> {
        self.eval(scripts::interactive_elements()).await
    }

    async fn page_facts(&self) -> Result<PageFacts, AdapterError> {
        self.eval(scripts::page_facts()).await
    }

    async fn count_matches(&self, selector: &str) -> Result<usize, AdapterError> {
        let query = SelectorQuery::parse(selector);
        self.eval(scripts::count_matches(&query)).await
    }

    async fn screenshot(&self, target: &CaptureTarget) -> Result<Vec<u8>, AdapterError> {
        match target {
            CaptureTarget::Viewport | CaptureTarget::FullPage => {
                let params = ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(matches!(target, CaptureTarget::FullPage))
                    .build();
                Ok(self.page.screenshot(params).await?)
            }
            CaptureTarget::Element(selector) => {
                let SelectorQuery::Css { selector } = SelectorQuery::parse(selector) else {
                    return Err(AdapterError::new(AdapterErrorKind::TargetNotFound)
                        .with_hint("element capture needs a CSS selector"));
                };
                let element = self.page.find_element(selector.as_str()).await.map_err(|err| {
                    AdapterError::new(AdapterErrorKind::TargetNotFound).with_hint(format!("{selector}: {err}"))
                })?;
                Ok(element.screenshot(CaptureScreenshotFormat::Png).await?)
            }
        }
    }

    async fn close(&self) -> Result<(), AdapterError> {
        self.page.clone().close().await?;
        Ok(())
    }
}
