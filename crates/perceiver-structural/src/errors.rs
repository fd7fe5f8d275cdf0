use cdp_adapter::AdapterError;
use thiserror::Error;
use uitest_core_types::ToolFailure;

#[derive(Debug, Error)]
pub enum PerceiverError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("driver error: {0}")]
    Driver(#[from] AdapterError),
    #[error("{stage} exceeded {timeout_ms}ms")]
    Timeout { stage: &'static str, timeout_ms: u64 },
    #[error("internal error: {0}")]
    Internal(String),
}

impl PerceiverError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<PerceiverError> for ToolFailure {
    fn from(err: PerceiverError) -> Self {
        match err {
            PerceiverError::InvalidUrl(url) => ToolFailure::invalid_input(format!("invalid url: {url}")),
            PerceiverError::Driver(inner) => inner.into(),
            timeout @ PerceiverError::Timeout { .. } => ToolFailure::timeout(timeout.to_string()),
            PerceiverError::Internal(msg) => ToolFailure::internal(msg),
        }
    }
}
