use std::path::PathBuf;

use thiserror::Error;
use uitest_core_types::ToolFailure;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("failed to read pattern index {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed pattern index {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("question is empty")]
    EmptyQuestion,
    #[error("no pattern matches '{0}'")]
    NoMatches(String),
}

impl From<PatternError> for ToolFailure {
    fn from(err: PatternError) -> Self {
        let message = err.to_string();
        match err {
            PatternError::Io { .. } | PatternError::Parse { .. } => ToolFailure::precondition(message),
            PatternError::EmptyQuestion => ToolFailure::invalid_input(message),
            PatternError::NoMatches(_) => ToolFailure::empty(message),
        }
    }
}
