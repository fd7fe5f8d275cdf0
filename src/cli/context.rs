use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use cdp_adapter::fixture::FixtureDriver;
use cdp_adapter::{BrowserDriver, ChromiumDriver, DriverPool};
use serde::Serialize;
use tracing::info;
use uitest_core_types::LlmBackend;

use super::env::CliArgs;
use super::output::OutputFormat;
use crate::config::Config;
use crate::llm::build_backend;

pub struct CliContext {
    config: Arc<Config>,
    config_path: PathBuf,
    output: OutputFormat,
    fixture: Option<PathBuf>,
    debug: bool,
}

/// Pooled driver for one command; Chromium is shut down explicitly when done.
pub struct BrowserSession {
    pool: Arc<DriverPool>,
    chromium: Option<Arc<ChromiumDriver>>,
}

impl BrowserSession {
    fn new(driver: Arc<dyn BrowserDriver>, chromium: Option<Arc<ChromiumDriver>>, max_pages: usize) -> Self {
        Self {
            pool: Arc::new(DriverPool::new(driver, max_pages)),
            chromium,
        }
    }

    pub fn driver(&self) -> Arc<dyn BrowserDriver> {
        self.pool.clone()
    }

    pub async fn shutdown(self) {
        self.pool.close();
        if let Some(chromium) = self.chromium {
            chromium.shutdown().await;
        }
    }
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf, cli: &CliArgs) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            output: cli.output,
            fixture: cli.fixture.clone(),
            debug: cli.debug,
        }
    }

    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    pub fn browser(&self) -> Result<BrowserSession> {
        match &self.fixture {
            Some(path) => {
                let driver = FixtureDriver::from_json_file(path)
                    .with_context(|| format!("loading page fixtures from {}", path.display()))?;
                info!(fixture = %path.display(), "serving pages from fixture file");
                Ok(BrowserSession::new(Arc::new(driver), None, self.config.browser.max_pages))
            }
            None => {
                let chromium = Arc::new(ChromiumDriver::new(self.config.browser.clone()));
                Ok(BrowserSession::new(chromium.clone(), Some(chromium), self.config.browser.max_pages))
            }
        }
    }

    /// Configured LLM unless `offline` is set.
    pub fn llm(&self, offline: bool) -> Result<Option<Arc<dyn LlmBackend>>> {
        if offline {
            return Ok(None);
        }
        build_backend(&self.config.llm)
    }

    /// Print a metric snapshot to stderr in debug mode.
    pub fn debug_metrics<T: Serialize>(&self, label: &str, snapshot: &T) -> Result<()> {
        if self.debug {
            eprintln!("{label} metrics: {}", serde_json::to_string(snapshot)?);
        }
        Ok(())
    }
}
