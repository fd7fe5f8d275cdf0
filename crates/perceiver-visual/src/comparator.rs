//! Baseline-backed visual regression checks.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cdp_adapter::{BrowserDriver, CaptureTarget};
use image::io::Reader as ImageReader;
use tracing::{debug, info, warn};
use uitest_core_types::{Tool, ToolFailure, ToolResult};

use crate::diff::{self, DiffOutcome};
use crate::errors::VisualError;
use crate::metrics::{self, CheckOutcome};
use crate::models::{DiffOptions, VisualCheckRequest, VisualCheckResult, VisualConfig};
use crate::storage::BaselineStore;

/// Captures a page (or one element) and compares it with the stored baseline.
///
/// The first capture for a check name becomes its baseline. Later captures
/// only ever write `current.png` and, when they differ, `diff.png`; the
/// baseline changes through [`VisualComparator::update_baseline`] or
/// [`VisualComparator::capture_baseline`] alone.
pub struct VisualComparator {
    driver: Arc<dyn BrowserDriver>,
    cfg: VisualConfig,
    store: BaselineStore,
}

impl VisualComparator {
    pub fn new(driver: Arc<dyn BrowserDriver>, cfg: VisualConfig) -> Self {
        let store = BaselineStore::new(cfg.baseline_dir.clone());
        Self { driver, cfg, store }
    }

    pub fn config(&self) -> &VisualConfig {
        &self.cfg
    }

    pub fn store(&self) -> &BaselineStore {
        &self.store
    }

    pub async fn check(&self, request: &VisualCheckRequest) -> Result<VisualCheckResult, VisualError> {
        let outcome = self.check_inner(request).await;
        match &outcome {
            Ok(result) => {
                let recorded = if !result.baseline_exists {
                    CheckOutcome::Bootstrapped
                } else if result.has_differences {
                    CheckOutcome::Different
                } else {
                    CheckOutcome::Matched
                };
                metrics::record_check(recorded);
                info!(
                    target: "perceiver-visual",
                    check = %result.check_name,
                    baseline_exists = result.baseline_exists,
                    has_differences = result.has_differences,
                    diff_pixels = result.diff_pixel_count,
                    diff_percentage = result.diff_percentage,
                    "visual check finished"
                );
            }
            Err(err) => {
                metrics::record_check(CheckOutcome::Failed);
                warn!(target: "perceiver-visual", check = %request.check_name, error = %err, "visual check failed");
            }
        }
        outcome
    }

    async fn check_inner(&self, request: &VisualCheckRequest) -> Result<VisualCheckResult, VisualError> {
        let options = self.diff_options(request)?;
        let baseline_path = self.store.baseline_path(&request.check_name)?;
        let current_path = self.store.current_path(&request.check_name)?;
        let diff_path = self.store.diff_path(&request.check_name)?;

        let current = self.capture(request).await?;

        let Some(baseline) = self.store.read(&baseline_path).await? else {
            let (width, height) = png_dimensions(&current)?;
            self.store.write(&baseline_path, &current).await?;
            self.store.write(&current_path, &current).await?;
            debug!(target: "perceiver-visual", path = %baseline_path.display(), "baseline created");
            return Ok(VisualCheckResult {
                check_name: request.check_name.clone(),
                has_differences: false,
                baseline_exists: false,
                diff_pixel_count: 0,
                diff_percentage: 0.0,
                total_pixels: u64::from(width) * u64::from(height),
                width,
                height,
                baseline_path,
                current_path,
                diff_path: None,
            });
        };

        self.store.write(&current_path, &current).await?;

        let max_diff_pixels = self.cfg.max_diff_pixels;
        let started = Instant::now();
        let (outcome, diff_png) = tokio::task::spawn_blocking(move || -> Result<(DiffOutcome, Option<Vec<u8>>), VisualError> {
            let outcome = diff::compare_png(&baseline, &current, options)?;
            let diff_png = if outcome.diff_pixels > max_diff_pixels {
                Some(diff::encode_png(&outcome.diff_image)?)
            } else {
                None
            };
            Ok((outcome, diff_png))
        })
        .await
        .map_err(|err| VisualError::Internal(format!("diff task failed: {err}")))??;
        metrics::record_diff_latency(started.elapsed());

        let written_diff = match diff_png {
            Some(png) => {
                self.store.write(&diff_path, &png).await?;
                Some(diff_path)
            }
            None => {
                self.store.discard(&diff_path).await?;
                None
            }
        };

        Ok(VisualCheckResult {
            check_name: request.check_name.clone(),
            has_differences: written_diff.is_some(),
            baseline_exists: true,
            diff_pixel_count: outcome.diff_pixels,
            diff_percentage: outcome.percentage(),
            total_pixels: outcome.total_pixels(),
            width: outcome.width,
            height: outcome.height,
            baseline_path,
            current_path,
            diff_path: written_diff,
        })
    }

    /// Promote the last `current.png` of a check to its baseline.
    pub async fn update_baseline(&self, check_name: &str) -> Result<PathBuf, VisualError> {
        let current_path = self.store.current_path(check_name)?;
        let baseline_path = self.store.baseline_path(check_name)?;
        let current = self
            .store
            .read(&current_path)
            .await?
            .ok_or_else(|| VisualError::NoCurrentCapture(check_name.to_string()))?;
        self.store.write(&baseline_path, &current).await?;
        self.store.discard(&self.store.diff_path(check_name)?).await?;
        info!(target: "perceiver-visual", check = %check_name, "baseline updated from last capture");
        Ok(baseline_path)
    }

    /// Recapture and overwrite the baseline unconditionally.
    pub async fn capture_baseline(&self, request: &VisualCheckRequest) -> Result<VisualCheckResult, VisualError> {
        let baseline_path = self.store.baseline_path(&request.check_name)?;
        let current_path = self.store.current_path(&request.check_name)?;
        let existed = self.store.read(&baseline_path).await?.is_some();

        let png = self.capture(request).await?;
        let (width, height) = png_dimensions(&png)?;
        self.store.write(&baseline_path, &png).await?;
        self.store.write(&current_path, &png).await?;
        self.store.discard(&self.store.diff_path(&request.check_name)?).await?;
        info!(target: "perceiver-visual", check = %request.check_name, replaced = existed, "baseline captured");

        Ok(VisualCheckResult {
            check_name: request.check_name.clone(),
            has_differences: false,
            baseline_exists: existed,
            diff_pixel_count: 0,
            diff_percentage: 0.0,
            total_pixels: u64::from(width) * u64::from(height),
            width,
            height,
            baseline_path,
            current_path,
            diff_path: None,
        })
    }

    fn diff_options(&self, request: &VisualCheckRequest) -> Result<DiffOptions, VisualError> {
        if request.target_url.trim().is_empty() {
            return Err(VisualError::InvalidInput("target_url is empty".into()));
        }
        let threshold = request.config.threshold.unwrap_or(self.cfg.threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(VisualError::InvalidInput(format!(
                "threshold {threshold} outside 0..1"
            )));
        }
        Ok(DiffOptions {
            threshold,
            include_aa: self.cfg.include_aa,
        })
    }

    async fn capture(&self, request: &VisualCheckRequest) -> Result<Vec<u8>, VisualError> {
        let deadline = Duration::from_millis(self.cfg.capture_timeout_ms);
        let page = self.driver.open(&request.target_url, deadline).await?;
        let target = CaptureTarget::from_request(request.selector.as_deref(), request.full_page);
        let shot = page.screenshot(&target).await;
        if let Err(err) = page.close().await {
            debug!(target: "perceiver-visual", error = %err, "page close failed");
        }
        Ok(shot?)
    }
}

fn png_dimensions(bytes: &[u8]) -> Result<(u32, u32), VisualError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| VisualError::ImageProcessing(format!("format detection failed: {err}")))?;
    Ok(reader.into_dimensions()?)
}

#[async_trait]
impl Tool for VisualComparator {
    type Input = VisualCheckRequest;
    type Output = VisualCheckResult;

    fn name(&self) -> &'static str {
        "visual_comparator"
    }

    async fn call(&self, input: VisualCheckRequest) -> ToolResult<VisualCheckResult> {
        self.check(&input).await.map_err(ToolFailure::from)
    }
}
