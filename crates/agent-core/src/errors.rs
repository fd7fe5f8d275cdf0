use thiserror::Error;
use tool_codegen::CodegenError;
use uitest_core_types::LlmError;

use crate::agent_loop::ActionKind;

/// Reasons an LLM decision was not used.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("llm call failed: {0}")]
    Llm(#[from] LlmError),

    /// The reply did not carry the decision schema.
    #[error("unparseable decision: {0}")]
    Parse(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("{kind} not admissible: {reason}")]
    Inadmissible { kind: ActionKind, reason: String },
}

impl AgentError {
    pub fn inadmissible(kind: ActionKind, reason: impl Into<String>) -> Self {
        Self::Inadmissible {
            kind,
            reason: reason.into(),
        }
    }
}

/// Errors that end [`crate::Orchestrator::run`].
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The step budget ran out; `pending` is the phase still outstanding.
    #[error("max steps exceeded ({max_steps}); pending: {pending}")]
    MaxStepsExceeded { max_steps: u32, pending: ActionKind },

    #[error("persisting artifacts failed: {0}")]
    Persistence(#[from] CodegenError),
}
