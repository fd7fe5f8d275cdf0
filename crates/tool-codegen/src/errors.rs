use std::path::PathBuf;

use thiserror::Error;
use uitest_core_types::ToolFailure;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("no scenarios to generate code for")]
    NoScenarios,
    #[error("invalid {kind} name '{value}'")]
    InvalidName { kind: &'static str, value: String },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<CodegenError> for ToolFailure {
    fn from(err: CodegenError) -> Self {
        let message = err.to_string();
        match err {
            CodegenError::NoScenarios => ToolFailure::precondition(message),
            CodegenError::InvalidName { .. } => ToolFailure::invalid_input(message),
            CodegenError::Io { .. } => ToolFailure::internal(message),
        }
    }
}
