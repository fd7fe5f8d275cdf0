//! Orchestrator: a fold of observations over the agent state.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use pattern_repo::PatternQuery;
use perceiver_structural::InspectRequest;
use serde::Serialize;
use tool_codegen::CodegenRequest;
use tool_scenarios::ScenarioRequest;
use tracing::{info, warn};
use uitest_core_types::{GeneratedArtifacts, LlmBackend, TaskId, ToolFailure, ToolResult};

use super::config::AgentLoopConfig;
use super::toolbox::Toolbox;
use super::types::{Action, ActionKind, Observation, StepRecord};
use crate::errors::OrchestratorError;
use crate::metrics;
use crate::model::GenerationTask;
use crate::planner::{rule_table, DecisionPolicy, LlmPolicy, RuleBasedPolicy};
use crate::state::{reduce, AgentState, FailureRecord, StateDelta};

/// Result of a completed task.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub task_id: TaskId,
    pub state: AgentState,
    pub steps: Vec<StepRecord>,
    pub total_time_ms: u64,
}

impl RunOutcome {
    pub fn artifacts(&self) -> Option<&GeneratedArtifacts> {
        self.state.generated_artifacts.as_ref()
    }

    pub fn persisted_paths(&self) -> &[PathBuf] {
        &self.state.persisted_paths
    }

    pub fn steps_taken(&self) -> usize {
        self.steps.len()
    }
}

pub struct OrchestratorBuilder {
    toolbox: Toolbox,
    cfg: AgentLoopConfig,
    llm: Option<Arc<dyn LlmBackend>>,
    policy: Option<Arc<dyn DecisionPolicy>>,
}

impl OrchestratorBuilder {
    pub fn with_config(mut self, cfg: AgentLoopConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Decide with the LLM when `llm_decisions` is on.
    pub fn with_llm(mut self, llm: Arc<dyn LlmBackend>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Explicit policy; takes precedence over [`Self::with_llm`].
    pub fn with_policy(mut self, policy: Arc<dyn DecisionPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn build(self) -> Orchestrator {
        let policy: Arc<dyn DecisionPolicy> = match (self.policy, self.llm) {
            (Some(policy), _) => policy,
            (None, Some(llm)) if self.cfg.llm_decisions => Arc::new(LlmPolicy::new(llm)),
            _ => Arc::new(RuleBasedPolicy::new()),
        };
        Orchestrator {
            policy,
            toolbox: self.toolbox,
            cfg: self.cfg,
        }
    }
}

/// Runs one generation task to completion or until the step budget is spent.
///
/// Tool failures are observations; only an exhausted budget or a
/// persistence error ends [`Orchestrator::run`] with an error.
pub struct Orchestrator {
    policy: Arc<dyn DecisionPolicy>,
    toolbox: Toolbox,
    cfg: AgentLoopConfig,
}

impl Orchestrator {
    pub fn builder(toolbox: Toolbox) -> OrchestratorBuilder {
        OrchestratorBuilder {
            toolbox,
            cfg: AgentLoopConfig::default(),
            llm: None,
            policy: None,
        }
    }

    /// Rule-table orchestrator with default configuration.
    pub fn new(toolbox: Toolbox) -> Self {
        Self::builder(toolbox).build()
    }

    pub fn config(&self) -> &AgentLoopConfig {
        &self.cfg
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub async fn run(&self, task: &GenerationTask) -> Result<RunOutcome, OrchestratorError> {
        let started = Instant::now();
        info!(
            target: "agent-core",
            task = %task.id,
            feature = %task.feature_name,
            team = %task.team,
            policy = self.policy.name(),
            max_steps = self.cfg.max_steps,
            "generation task started"
        );
        let result = self.drive(task, started).await;
        metrics::record_run(result.is_ok());
        if let Err(err) = &result {
            warn!(target: "agent-core", task = %task.id, error = %err, "generation task failed");
        }
        result
    }

    async fn drive(&self, task: &GenerationTask, started: Instant) -> Result<RunOutcome, OrchestratorError> {
        let mut state = AgentState::default();
        let mut steps = Vec::new();

        loop {
            state = state.next_step();
            if state.step_count > self.cfg.max_steps {
                return Err(OrchestratorError::MaxStepsExceeded {
                    max_steps: self.cfg.max_steps,
                    pending: rule_table(task, &state).kind,
                });
            }

            let action = self.policy.decide(task, &state).await;
            let step_started = Instant::now();
            let observation = self.execute(task, &state, &action).await?;
            let failed = observation.state_delta.failure.is_some();
            metrics::record_step(failed);

            let record = StepRecord {
                step: state.step_count,
                action: action.kind,
                source: action.source,
                summary: observation.summary.clone(),
                failed,
                duration_ms: step_started.elapsed().as_millis() as u64,
            };
            if failed {
                warn!(
                    target: "agent-core",
                    step = record.step,
                    action = %record.action,
                    source = record.source.as_str(),
                    summary = %record.summary,
                    "step failed"
                );
            } else {
                info!(
                    target: "agent-core",
                    step = record.step,
                    action = %record.action,
                    source = record.source.as_str(),
                    reasoning = %action.reasoning,
                    summary = %record.summary,
                    duration_ms = record.duration_ms,
                    "step completed"
                );
            }
            steps.push(record);

            state = reduce(state, observation);
            if state.completed {
                let total_time_ms = started.elapsed().as_millis() as u64;
                info!(
                    target: "agent-core",
                    task = %task.id,
                    steps = steps.len(),
                    files = state.persisted_paths.len(),
                    total_time_ms,
                    "generation task completed"
                );
                return Ok(RunOutcome {
                    task_id: task.id.clone(),
                    state,
                    steps,
                    total_time_ms,
                });
            }
        }
    }

    async fn execute(
        &self,
        task: &GenerationTask,
        state: &AgentState,
        action: &Action,
    ) -> Result<Observation, OrchestratorError> {
        let outcome: ToolResult<Observation> = match action.kind {
            ActionKind::Inspect => self.inspect(task).await,
            ActionKind::Retrieve => {
                let question = action
                    .question_override()
                    .map(str::to_string)
                    .unwrap_or_else(|| task.retrieval_question());
                self.retrieve(question).await
            }
            ActionKind::GenerateScenarios => self.generate_scenarios(task, state).await,
            ActionKind::GenerateCode => self.generate_code(task, state).await,
            ActionKind::Persist => match &state.generated_artifacts {
                Some(artifacts) => {
                    let paths = self.toolbox.writer.persist(&task.team, artifacts).await?;
                    let summary = format!("persisted {} file(s)", paths.len());
                    Ok(Observation::new(
                        summary,
                        StateDelta {
                            persisted_paths: paths,
                            completed: true,
                            ..Default::default()
                        },
                    )
                    .completing())
                }
                None => Err(ToolFailure::precondition("no generated artifacts to persist")),
            },
            ActionKind::Done => {
                if state.persisted_paths.is_empty() {
                    Err(ToolFailure::precondition("nothing persisted yet"))
                } else {
                    Ok(Observation::new("task finished", StateDelta::default()).completing())
                }
            }
        };

        Ok(outcome.unwrap_or_else(|failure| {
            Observation::new(
                format!("{} failed: {}", action.kind, failure),
                StateDelta::failure(FailureRecord {
                    step: state.step_count,
                    action: action.kind,
                    kind: failure.kind,
                    message: failure.message,
                }),
            )
        }))
    }

    async fn inspect(&self, task: &GenerationTask) -> ToolResult<Observation> {
        let url = task
            .target_url
            .as_ref()
            .ok_or_else(|| ToolFailure::precondition("no target URL to inspect"))?;
        let snapshot = self.toolbox.inspector.call(InspectRequest::new(url.clone())).await?;
        Ok(Observation::new(
            format!("inspected {}", snapshot.summary()),
            StateDelta {
                structural_snapshot: Some(snapshot),
                ..Default::default()
            },
        ))
    }

    async fn retrieve(&self, question: String) -> ToolResult<Observation> {
        let answer = self.toolbox.patterns.call(PatternQuery::new(question)).await?;
        Ok(Observation::new(
            format!("retrieved {} pattern source(s)", answer.sources.len()),
            StateDelta {
                retrieved_patterns: Some(answer),
                ..Default::default()
            },
        ))
    }

    async fn generate_scenarios(&self, task: &GenerationTask, state: &AgentState) -> ToolResult<Observation> {
        let mut request = ScenarioRequest::new(task.description.clone(), task.feature_name.clone());
        if let Some(snapshot) = &state.structural_snapshot {
            request = request.with_snapshot(snapshot.clone());
        }
        if let Some(patterns) = &state.retrieved_patterns {
            request = request.with_patterns(patterns.clone());
        }
        let scenarios = self.toolbox.scenarios.call(request).await?;
        Ok(Observation::new(
            format!("generated {} scenario(s)", scenarios.len()),
            StateDelta {
                scenarios: Some(scenarios),
                ..Default::default()
            },
        ))
    }

    async fn generate_code(&self, task: &GenerationTask, state: &AgentState) -> ToolResult<Observation> {
        let scenarios = state
            .scenarios
            .clone()
            .ok_or_else(|| ToolFailure::precondition("no scenarios to render"))?;
        let request = CodegenRequest {
            feature_name: task.feature_name.clone(),
            target_url: task.target_url.clone(),
            scenarios,
            snapshot: state.structural_snapshot.clone(),
            patterns: state.retrieved_patterns.clone(),
        };
        let artifacts = self.toolbox.codegen.call(request).await?;
        Ok(Observation::new(
            format!("rendered {} bytes across 3 files", artifacts.total_bytes()),
            StateDelta {
                generated_artifacts: Some(artifacts),
                ..Default::default()
            },
        ))
    }
}
