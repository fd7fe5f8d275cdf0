use std::path::PathBuf;

use cdp_adapter::AdapterError;
use thiserror::Error;
use uitest_core_types::ToolFailure;

/// Errors that abort a heal attempt.
///
/// "Nothing to fix" and "no verified replacement" are outcomes, not errors;
/// see [`crate::HealStatus`].
#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("source file not found: {0}")]
    SourceMissing(PathBuf),

    #[error("i/o on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("browser: {0}")]
    Driver(#[from] AdapterError),

    #[error("internal: {0}")]
    Internal(String),
}

impl LocatorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LocatorError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the same request could succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            LocatorError::Driver(err) => err.retriable || err.is_timeout(),
            _ => false,
        }
    }
}

impl From<LocatorError> for ToolFailure {
    fn from(err: LocatorError) -> Self {
        match err {
            LocatorError::Driver(inner) => ToolFailure::from(inner),
            LocatorError::SourceMissing(_) => ToolFailure::precondition(err.to_string()),
            LocatorError::InvalidSelector(_) => ToolFailure::invalid_input(err.to_string()),
            LocatorError::Io { .. } | LocatorError::Internal(_) => ToolFailure::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::AdapterErrorKind;
    use uitest_core_types::ToolFailureKind;

    #[test]
    fn maps_to_tool_failure_kinds() {
        let missing: ToolFailure = LocatorError::SourceMissing("a.ts".into()).into();
        assert_eq!(missing.kind, ToolFailureKind::Precondition);

        let timeout: ToolFailure = LocatorError::Driver(AdapterError::new(AdapterErrorKind::NavTimeout)).into();
        assert_eq!(timeout.kind, ToolFailureKind::Timeout);

        let blank: ToolFailure = LocatorError::InvalidSelector(String::new()).into();
        assert_eq!(blank.kind, ToolFailureKind::InvalidInput);
    }

    #[test]
    fn only_driver_timeouts_retry() {
        assert!(LocatorError::Driver(AdapterError::new(AdapterErrorKind::NavTimeout)).is_retryable());
        assert!(!LocatorError::SourceMissing("x".into()).is_retryable());
    }
}
