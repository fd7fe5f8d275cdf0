use thiserror::Error;

/// Why an LLM reply was not usable. Never surfaced to callers: every
/// variant triggers the deterministic generator.
#[derive(Debug, Error)]
pub enum ScenarioParseError {
    #[error("reply contains no JSON object")]
    NoJson,
    #[error("reply is not valid scenario JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("reply contains no usable scenario")]
    NoScenarios,
}
