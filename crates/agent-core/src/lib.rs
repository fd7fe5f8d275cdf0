//! Agent core.
//!
//! Drives one test-suite generation task: a decision policy picks the next
//! phase, the orchestrator dispatches it to the matching tool and folds the
//! observation into the agent state until the artifacts are persisted.

pub mod agent_loop;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod planner;
pub mod state;

pub use agent_loop::{
    Action, ActionKind, ActionSource, AgentLoopConfig, Observation, Orchestrator, OrchestratorBuilder,
    RunOutcome, StepRecord, Toolbox,
};
pub use errors::{AgentError, OrchestratorError};
pub use model::GenerationTask;
pub use planner::{rule_table, DecisionPolicy, LlmPolicy, RuleBasedPolicy};
pub use state::{reduce, AgentState, FailureRecord, StateDelta};
