//! Orchestration loop.
//!
//! ```text
//! while step_count <= max_steps:
//!     action      = policy.decide(task, state)
//!     observation = execute(action)        // one tool call
//!     state       = reduce(state, observation)
//!     if observation.task_complete: return
//! ```

pub mod config;
pub mod controller;
pub mod prompt;
pub mod toolbox;
pub mod types;

pub use config::AgentLoopConfig;
pub use controller::{Orchestrator, OrchestratorBuilder, RunOutcome};
pub use prompt::{format_system_prompt, format_user_message, parse_decision};
pub use toolbox::Toolbox;
pub use types::{Action, ActionKind, ActionSource, Observation, StepRecord};
