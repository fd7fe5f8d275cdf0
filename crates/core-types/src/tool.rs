//! The tool contract shared by every capability the agent can invoke.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result returned by every [`Tool`].
pub type ToolResult<T> = Result<T, ToolFailure>;

/// A named unit of capability with a single asynchronous call.
///
/// Tools never panic or swallow errors: anything that prevents a usable
/// result is reported as a [`ToolFailure`] so callers can tell "no usable
/// output" apart from "crashed".
#[async_trait]
pub trait Tool: Send + Sync {
    type Input: Send + Sync;
    type Output: Send;

    /// Stable name used in logs and prompts.
    fn name(&self) -> &'static str;

    async fn call(&self, input: Self::Input) -> ToolResult<Self::Output>;
}

/// Failure categories surfaced at the tool boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolFailureKind {
    /// Network or browser transport failure.
    Network,
    /// A bounded wait elapsed.
    Timeout,
    /// The tool ran but produced nothing usable.
    EmptyResult,
    /// A produced value failed live verification.
    Unverified,
    /// The input did not satisfy the tool contract.
    InvalidInput,
    /// A precondition on the environment does not hold.
    Precondition,
    /// Unexpected internal failure.
    Internal,
}

impl ToolFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolFailureKind::Network => "network",
            ToolFailureKind::Timeout => "timeout",
            ToolFailureKind::EmptyResult => "empty-result",
            ToolFailureKind::Unverified => "unverified",
            ToolFailureKind::InvalidInput => "invalid-input",
            ToolFailureKind::Precondition => "precondition",
            ToolFailureKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ToolFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure `{kind, message}`.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ToolFailure {
    pub kind: ToolFailureKind,
    pub message: String,
}

impl ToolFailure {
    pub fn new(kind: ToolFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ToolFailureKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolFailureKind::Timeout, message)
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self::new(ToolFailureKind::EmptyResult, message)
    }

    pub fn unverified(message: impl Into<String>) -> Self {
        Self::new(ToolFailureKind::Unverified, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ToolFailureKind::InvalidInput, message)
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(ToolFailureKind::Precondition, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolFailureKind::Internal, message)
    }

    /// `true` when the tool ran cleanly but had nothing to return.
    pub fn is_empty_result(&self) -> bool {
        self.kind == ToolFailureKind::EmptyResult
    }
}
