//! Configuration for the orchestration loop.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentLoopConfig {
    /// Iterations before the task fails.
    /// Default: 10
    pub max_steps: u32,

    /// Consult the LLM policy when one is attached.
    /// Default: true
    pub llm_decisions: bool,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            llm_decisions: true,
        }
    }
}

impl AgentLoopConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set max steps.
    pub fn max_steps(mut self, steps: u32) -> Self {
        self.max_steps = steps.max(1);
        self
    }

    /// Builder: toggle LLM decisions.
    pub fn llm_decisions(mut self, enabled: bool) -> Self {
        self.llm_decisions = enabled;
        self
    }
}
