use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uitest_core_types::ToolFailure;

/// High-level error categories surfaced by the adapter.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdapterErrorKind {
    #[error("browser launch failed")]
    Launch,
    #[error("navigation timed out")]
    NavTimeout,
    #[error("navigation failed")]
    NavFailed,
    #[error("cdp i/o failure")]
    CdpIo,
    #[error("script evaluation failed")]
    ScriptFailed,
    #[error("target element not found")]
    TargetNotFound,
    #[error("driver pool closed")]
    PoolClosed,
    #[error("internal error")]
    Internal,
}

/// Enriched error metadata passed back to higher layers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub hint: Option<String>,
    pub retriable: bool,
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for AdapterError {}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind) -> Self {
        Self {
            kind,
            hint: None,
            retriable: false,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn retriable(mut self, flag: bool) -> Self {
        self.retriable = flag;
        self
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == AdapterErrorKind::NavTimeout
    }
}

impl From<chromiumoxide::error::CdpError> for AdapterError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AdapterError::new(AdapterErrorKind::CdpIo)
            .with_hint(err.to_string())
            .retriable(true)
    }
}

impl From<AdapterError> for ToolFailure {
    fn from(err: AdapterError) -> Self {
        let message = err.to_string();
        match err.kind {
            AdapterErrorKind::NavTimeout => ToolFailure::timeout(message),
            AdapterErrorKind::TargetNotFound => ToolFailure::empty(message),
            AdapterErrorKind::Internal => ToolFailure::internal(message),
            AdapterErrorKind::Launch
            | AdapterErrorKind::NavFailed
            | AdapterErrorKind::CdpIo
            | AdapterErrorKind::ScriptFailed
            | AdapterErrorKind::PoolClosed => ToolFailure::network(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uitest_core_types::ToolFailureKind;

    #[test]
    fn display_includes_hint() {
        let err = AdapterError::new(AdapterErrorKind::NavTimeout).with_hint("https://example.test");
        assert_eq!(err.to_string(), "navigation timed out: https://example.test");
    }

    #[test]
    fn timeouts_map_to_timeout_failures() {
        let failure: ToolFailure = AdapterError::new(AdapterErrorKind::NavTimeout).into();
        assert_eq!(failure.kind, ToolFailureKind::Timeout);

        let failure: ToolFailure = AdapterError::new(AdapterErrorKind::CdpIo).into();
        assert_eq!(failure.kind, ToolFailureKind::Network);
    }
}
