//! uitestgen library
//!
//! The binary is a thin wrapper over [`cli::run`]; configuration and the
//! LLM vendor backends are exposed for integration testing.

pub mod cli;
pub mod config;
pub mod llm;

pub use config::{Config, LlmProviderKind, LlmSettings, PatternSettings};
