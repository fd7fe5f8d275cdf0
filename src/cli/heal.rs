use std::path::PathBuf;

use action_locator::{HealRequest, HealStatus, HealingResult, SelectorHealer};
use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use super::context::CliContext;
use super::output::emit;

#[derive(Args, Clone, Debug)]
pub struct HealArgs {
    /// Page the test runs against
    #[arg(short, long)]
    pub url: String,

    /// Selector that no longer matches
    #[arg(short, long)]
    pub selector: String,

    /// Test source containing the selector
    #[arg(short, long, value_name = "FILE")]
    pub file: PathBuf,

    /// Source lines around the failing call, passed to the LLM
    #[arg(long)]
    pub context: Option<String>,

    /// Try lower-ranked candidates when the best one fails verification
    #[arg(long)]
    pub cascade: bool,

    /// Discard candidates below this confidence (0-100)
    #[arg(long)]
    pub min_confidence: Option<u8>,

    /// Rank candidates heuristically only
    #[arg(long)]
    pub offline: bool,
}

pub async fn cmd_heal(args: HealArgs, ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let mut heal_cfg = config.healing.clone();
    if args.cascade {
        heal_cfg = heal_cfg.with_cascade(true);
    }
    if let Some(min) = args.min_confidence {
        heal_cfg = heal_cfg.with_min_confidence(min);
    }

    let session = ctx.browser()?;
    let mut healer = SelectorHealer::new(session.driver()).with_config(heal_cfg);
    if let Some(llm) = ctx.llm(args.offline)? {
        healer = healer.with_llm(llm);
    }

    let mut request = HealRequest::new(&args.url, &args.selector, &args.file);
    if let Some(context) = &args.context {
        request = request.with_context(context);
    }
    info!(selector = %args.selector, file = %args.file.display(), "healing selector");

    let result = healer.heal(&request).await;
    session.shutdown().await;
    ctx.debug_metrics("healing", &action_locator::metrics::snapshot())?;

    let result = result.with_context(|| format!("healing '{}' in {}", args.selector, args.file.display()))?;
    emit(ctx.output(), &result, render_result)?;
    if result.status == HealStatus::NoVerifiedReplacement {
        bail!("no verified replacement for '{}'", args.selector);
    }
    Ok(())
}

fn render_result(result: &HealingResult) -> String {
    let mut lines = vec![format!("Status: {}", result.status.as_str())];
    if let Some(selector) = &result.new_selector {
        lines.push(format!(
            "Replaced {} -> {} ({}% confidence, {} occurrence(s))",
            result.original_selector, selector, result.confidence, result.replacements
        ));
    }
    lines.push(format!("Reasoning: {}", result.reasoning));
    if let Some(backup) = &result.backup_path {
        lines.push(format!("Backup: {}", backup.display()));
    }
    if !result.candidates.is_empty() {
        lines.push("Candidates:".to_string());
        for candidate in &result.candidates {
            let mark = if result.rejected.contains(&candidate.selector) { "x" } else { "-" };
            lines.push(format!("  {mark} {} ({}%)", candidate.selector, candidate.confidence));
        }
    }
    lines.join("\n")
}
