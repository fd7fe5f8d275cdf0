use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cdp_adapter::fixture::FixtureDriver;
use cdp_adapter::BrowserDriver;
use clap::{Args, Subcommand};
use perceiver_visual::{VisualCheckRequest, VisualComparator};
use serde_json::json;

use super::check::visual_config;
use super::context::CliContext;
use super::output::emit;

#[derive(Args, Clone, Debug)]
pub struct BaselineArgs {
    /// Baseline root (overrides configuration)
    #[arg(long, value_name = "DIR", global = true)]
    pub baseline_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub action: BaselineAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum BaselineAction {
    /// Accept the last capture of a check as its new baseline
    Update {
        /// Check name
        name: String,
    },
    /// Capture a page and store it as the baseline, replacing any existing one
    Capture {
        #[arg(short, long)]
        url: String,
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        selector: Option<String>,
        #[arg(long, conflicts_with = "selector")]
        full_page: bool,
    },
}

pub async fn cmd_baseline(args: BaselineArgs, ctx: &CliContext) -> Result<()> {
    let cfg = visual_config(ctx.config(), args.baseline_dir.clone());
    match args.action {
        BaselineAction::Update { name } => {
            // Promotion only touches files, so no browser is started.
            let comparator = VisualComparator::new(no_browser(), cfg);
            let path = comparator
                .update_baseline(&name)
                .await
                .with_context(|| format!("updating baseline '{name}'"))?;
            let summary = json!({ "check_name": name, "baseline_path": path });
            emit(ctx.output(), &summary, |_| format!("Baseline for '{name}' updated: {}", path.display()))
        }
        BaselineAction::Capture {
            url,
            name,
            selector,
            full_page,
        } => {
            let session = ctx.browser()?;
            let comparator = VisualComparator::new(session.driver(), cfg);
            let mut request = VisualCheckRequest::new(url, &name);
            if let Some(selector) = selector {
                request = request.with_selector(selector);
            }
            if full_page {
                request = request.full_page();
            }
            let result = comparator.capture_baseline(&request).await;
            session.shutdown().await;
            let result = result.with_context(|| format!("capturing baseline '{name}'"))?;
            emit(ctx.output(), &result, |result| {
                format!(
                    "Baseline for '{}' captured ({}x{}): {}",
                    result.check_name,
                    result.width,
                    result.height,
                    result.baseline_path.display()
                )
            })
        }
    }
}

fn no_browser() -> Arc<dyn BrowserDriver> {
    Arc::new(FixtureDriver::new())
}
