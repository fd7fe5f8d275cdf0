//! Data models for visual checks.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default colour-distance threshold, 0..1.
pub const DEFAULT_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    pub threshold: f64,
    /// Count anti-aliased pixels as differences.
    pub include_aa: bool,
    /// Differences up to this many pixels are tolerated.
    pub max_diff_pixels: u64,
    pub baseline_dir: PathBuf,
    pub capture_timeout_ms: u64,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            include_aa: false,
            max_diff_pixels: 0,
            baseline_dir: PathBuf::from("visual-baselines"),
            capture_timeout_ms: 30_000,
        }
    }
}

impl VisualConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_include_aa(mut self, include_aa: bool) -> Self {
        self.include_aa = include_aa;
        self
    }

    pub fn with_max_diff_pixels(mut self, max: u64) -> Self {
        self.max_diff_pixels = max;
        self
    }

    pub fn with_baseline_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.baseline_dir = dir.into();
        self
    }

    pub fn with_capture_timeout_ms(mut self, ms: u64) -> Self {
        self.capture_timeout_ms = ms;
        self
    }
}

/// Per-check override of the configured threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualCheckRequest {
    pub target_url: String,
    pub check_name: String,
    /// Capture only the first element matching this selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default)]
    pub full_page: bool,
    #[serde(default)]
    pub config: CheckOverrides,
}

impl VisualCheckRequest {
    pub fn new(target_url: impl Into<String>, check_name: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            check_name: check_name.into(),
            selector: None,
            full_page: false,
            config: CheckOverrides::default(),
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn full_page(mut self) -> Self {
        self.full_page = true;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.config.threshold = Some(threshold);
        self
    }
}

/// Diff tuning for one comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffOptions {
    pub threshold: f64,
    pub include_aa: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            include_aa: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualCheckResult {
    pub check_name: String,
    pub has_differences: bool,
    /// False when this run created the baseline.
    pub baseline_exists: bool,
    pub diff_pixel_count: u64,
    pub diff_percentage: f64,
    pub total_pixels: u64,
    pub width: u32,
    pub height: u32,
    pub baseline_path: PathBuf,
    pub current_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_path: Option<PathBuf>,
}
