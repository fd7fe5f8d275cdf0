use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use perceiver_visual::{VisualCheckRequest, VisualCheckResult, VisualComparator, VisualConfig};

use super::context::CliContext;
use super::output::emit;
use crate::config::Config;

#[derive(Args, Clone, Debug)]
pub struct CheckArgs {
    /// Page to capture
    #[arg(short, long)]
    pub url: String,

    /// Check name; baselines live under `<baseline-dir>/<name>/`
    #[arg(short, long)]
    pub name: String,

    /// Capture only the first element matching this selector
    #[arg(short, long)]
    pub selector: Option<String>,

    /// Capture the whole scrollable page
    #[arg(long, conflicts_with = "selector")]
    pub full_page: bool,

    /// Colour-distance threshold (0..1) for this check
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Baseline root (overrides configuration)
    #[arg(long, value_name = "DIR")]
    pub baseline_dir: Option<PathBuf>,
}

pub async fn cmd_check(args: CheckArgs, ctx: &CliContext) -> Result<()> {
    let session = ctx.browser()?;
    let comparator = VisualComparator::new(session.driver(), visual_config(ctx.config(), args.baseline_dir.clone()));

    let mut request = VisualCheckRequest::new(&args.url, &args.name);
    if let Some(selector) = &args.selector {
        request = request.with_selector(selector);
    }
    if args.full_page {
        request = request.full_page();
    }
    if let Some(threshold) = args.threshold {
        request = request.with_threshold(threshold);
    }

    let result = comparator.check(&request).await;
    session.shutdown().await;
    ctx.debug_metrics("visual", &perceiver_visual::metrics::snapshot())?;

    let result = result.with_context(|| format!("visual check '{}' failed", args.name))?;
    emit(ctx.output(), &result, render_result)?;
    if result.has_differences {
        bail!(
            "visual check '{}' differs from its baseline ({:.2}% of pixels)",
            result.check_name,
            result.diff_percentage
        );
    }
    Ok(())
}

pub(super) fn visual_config(config: &Config, baseline_dir: Option<PathBuf>) -> VisualConfig {
    let cfg = config.visual.clone();
    match baseline_dir {
        Some(dir) => cfg.with_baseline_dir(dir),
        None => cfg,
    }
}

fn render_result(result: &VisualCheckResult) -> String {
    let mut lines = Vec::new();
    if !result.baseline_exists {
        lines.push(format!("Baseline created for '{}'", result.check_name));
    } else if result.has_differences {
        lines.push(format!(
            "'{}' differs: {} of {} pixels ({:.2}%)",
            result.check_name, result.diff_pixel_count, result.total_pixels, result.diff_percentage
        ));
    } else {
        lines.push(format!("'{}' matches its baseline", result.check_name));
    }
    lines.push(format!("  size:     {}x{}", result.width, result.height));
    lines.push(format!("  baseline: {}", result.baseline_path.display()));
    lines.push(format!("  current:  {}", result.current_path.display()));
    if let Some(diff) = &result.diff_path {
        lines.push(format!("  diff:     {}", diff.display()));
    }
    lines.join("\n")
}
