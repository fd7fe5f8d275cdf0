use std::path::{Path, PathBuf};
use std::sync::Arc;

use agent_core::{GenerationTask, Orchestrator, RunOutcome, Toolbox};
use anyhow::{Context, Result};
use clap::Args;
use pattern_repo::{PatternConfig, PatternIndex, PatternRepository};
use perceiver_structural::{InspectorConfig, PageInspector};
use tool_codegen::{CodeGenerator, FsArtifactWriter};
use tool_scenarios::ScenarioGenerator;
use tracing::{info, warn};

use super::context::CliContext;
use super::output::emit;
use crate::config::Config;

#[derive(Args, Clone, Debug)]
pub struct GenerateArgs {
    /// What the suite should cover
    pub description: String,

    /// Feature name used for file and class names
    #[arg(short, long)]
    pub feature: String,

    /// Team directory under the output root
    #[arg(short, long, default_value = "default")]
    pub team: String,

    /// Page to inspect before generating
    #[arg(short, long)]
    pub url: Option<String>,

    /// Question sent to the pattern repository
    #[arg(long)]
    pub question: Option<String>,

    /// Pattern index (JSON) or directory of existing tests
    #[arg(long, value_name = "PATH")]
    pub patterns: Option<PathBuf>,

    /// Output root (overrides configuration)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Iteration budget (overrides configuration)
    #[arg(long)]
    pub max_steps: Option<u32>,

    /// Decide and generate without the LLM
    #[arg(long)]
    pub offline: bool,
}

pub async fn cmd_generate(args: GenerateArgs, ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let llm = ctx.llm(args.offline)?;
    let session = ctx.browser()?;

    let index = load_index(args.patterns.as_deref().or(config.patterns.index_path.as_deref()))?;
    let mut pattern_cfg = PatternConfig::default();
    if let Some(max_sources) = config.patterns.max_sources {
        pattern_cfg = pattern_cfg.with_max_sources(max_sources);
    }
    let mut patterns = PatternRepository::new(index).with_config(pattern_cfg);
    let mut scenarios = ScenarioGenerator::builder();
    if let Some(llm) = &llm {
        patterns = patterns.with_llm(Arc::clone(llm));
        scenarios = scenarios.with_llm(Arc::clone(llm));
    }

    let output_root = args.output_dir.clone().unwrap_or_else(|| config.output_dir.clone());
    let toolbox = Toolbox::new(
        Arc::new(PageInspector::with_config(session.driver(), inspector_config(config))),
        Arc::new(patterns),
        Arc::new(scenarios.build()),
        Arc::new(CodeGenerator::default()),
        Arc::new(FsArtifactWriter::new(&output_root)),
    );

    let mut loop_cfg = config.agent.clone();
    if let Some(max_steps) = args.max_steps {
        loop_cfg = loop_cfg.max_steps(max_steps);
    }
    let mut builder = Orchestrator::builder(toolbox).with_config(loop_cfg);
    if let Some(llm) = llm {
        builder = builder.with_llm(llm);
    }
    let orchestrator = builder.build();

    let mut task = GenerationTask::new(&args.description, &args.feature, &args.team);
    if let Some(url) = &args.url {
        task = task.with_target_url(url);
    }
    if let Some(question) = &args.question {
        task = task.with_pattern_question(question);
    }
    info!(
        task = %task.id,
        policy = orchestrator.policy_name(),
        output = %output_root.display(),
        "running generation task"
    );

    let result = orchestrator.run(&task).await;
    session.shutdown().await;
    ctx.debug_metrics("agent", &agent_core::metrics::snapshot())?;
    ctx.debug_metrics("inspector", &perceiver_structural::metrics::snapshot())?;
    ctx.debug_metrics("patterns", &pattern_repo::metrics::snapshot())?;

    let outcome = result.with_context(|| format!("generation task for '{}' failed", args.feature))?;
    emit(ctx.output(), &outcome, render_outcome)
}

fn inspector_config(config: &Config) -> InspectorConfig {
    InspectorConfig::default().with_navigation_timeout_ms(config.browser.navigation_timeout_ms)
}

/// An absent path means an empty index: retrieval then fails and is skipped.
fn load_index(path: Option<&Path>) -> Result<PatternIndex> {
    let Some(path) = path else {
        return Ok(PatternIndex::default());
    };
    if !path.exists() {
        warn!(path = %path.display(), "pattern index not found; continuing without patterns");
        return Ok(PatternIndex::default());
    }
    let index = if path.is_dir() {
        PatternIndex::scan_dir(path)
    } else {
        PatternIndex::load(path)
    }
    .with_context(|| format!("loading pattern index {}", path.display()))?;
    info!(path = %path.display(), entries = index.len(), "pattern index loaded");
    Ok(index)
}

fn render_outcome(outcome: &RunOutcome) -> String {
    let mut lines = vec![format!(
        "Generated in {} step(s), {} ms",
        outcome.steps_taken(),
        outcome.total_time_ms
    )];
    for step in &outcome.steps {
        let marker = if step.failed { "x" } else { "+" };
        lines.push(format!(
            "  {marker} [{}] {} ({}): {}",
            step.step,
            step.action,
            step.source.as_str(),
            step.summary
        ));
    }
    if let Some(scenarios) = &outcome.state.scenarios {
        lines.push(format!("Scenarios: {}", scenarios.len()));
    }
    lines.push("Files:".to_string());
    for path in outcome.persisted_paths() {
        lines.push(format!("  {}", path.display()));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_index_is_scanned() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("login.spec.ts"), "test('login', async () => {});").unwrap();
        std::fs::write(dir.path().join("notes.md"), "not a test").unwrap();

        let index = load_index(Some(dir.path())).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn missing_index_is_empty() {
        let index = load_index(Some(Path::new("/definitely/not/here.json"))).unwrap();
        assert!(index.is_empty());
        assert!(load_index(None).unwrap().is_empty());
    }
}
