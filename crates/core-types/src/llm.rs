//! LLM backend port.
//!
//! The decision policy, scenario generator and selector ranking all talk to a
//! model through [`LlmBackend::complete`]. Every caller must tolerate
//! non-JSON output and fall back deterministically, so the port stays a plain
//! text-in/text-out contract.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmPrompt {
    pub system: String,
    pub user: String,
}

impl LlmPrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Request(String),

    #[error("llm returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("llm response missing content")]
    EmptyResponse,

    #[error("llm request timed out")]
    Timeout,

    #[error("llm backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Vendor/model label for logs.
    fn name(&self) -> &str {
        "llm"
    }

    async fn complete(&self, prompt: &LlmPrompt) -> Result<String, LlmError>;
}

/// Deterministic backend used for tests and offline runs.
///
/// Replies are served in order; once exhausted every call fails with
/// [`LlmError::Unavailable`], which exercises the callers' fallbacks.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLlm {
    replies: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    prompts: Arc<Mutex<Vec<LlmPrompt>>>,
}

impl ScriptedLlm {
    /// Backend with no replies: every call is unavailable.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let llm = Self::default();
        for reply in replies {
            llm.push_reply(reply);
        }
        llm
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: LlmError) {
        self.replies.lock().push_back(Err(error));
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<LlmPrompt> {
        self.prompts.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl LlmBackend for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &LlmPrompt) -> Result<String, LlmError> {
        self.prompts.lock().push(prompt.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Unavailable("no scripted reply left".to_string())))
    }
}

/// Pull the first JSON object out of free-form model output.
///
/// Handles bare objects, fenced code blocks and objects embedded in prose.
pub fn extract_json_object(raw: &str) -> Option<String> {
    if raw.trim_start().starts_with('{') {
        return balanced_object(raw.trim_start()).map(|value| trim_symmetric(&value));
    }

    let fence = "```";
    if let Some(start) = raw.find(fence) {
        let after_fence = &raw[start + fence.len()..];
        let after_lang = after_fence.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_');
        if let Some(end) = after_lang.find(fence) {
            let block = &after_lang[..end];
            if let Some(open) = block.find('{') {
                return balanced_object(&block[open..]).map(|value| trim_symmetric(&value));
            }
        }
    }

    let open = raw.find('{')?;
    balanced_object(&raw[open..]).map(|value| trim_symmetric(&value))
}

/// Scan from a leading `{` to its matching `}`, ignoring braces in strings.
fn balanced_object(text: &str) -> Option<String> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[..=idx].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn trim_symmetric(value: &str) -> String {
    value.trim().trim_matches('`').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_fenced_block() {
        let input = "Here is the decision:\n```json\n{\"action\":\"inspect\"}\n```";
        let extracted = extract_json_object(input).expect("json");
        assert_eq!(extracted, "{\"action\":\"inspect\"}");
    }

    #[test]
    fn extracts_from_inline_object() {
        let input = "text { \"foo\": {\"bar\": 1} } more";
        let extracted = extract_json_object(input).expect("json");
        assert_eq!(extracted, "{ \"foo\": {\"bar\": 1} }");
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let input = "{\"reasoning\": \"use } carefully\", \"action\": \"done\"} trailing";
        let extracted = extract_json_object(input).expect("json");
        assert!(extracted.ends_with("\"done\"}"));
    }

    #[test]
    fn returns_none_when_missing() {
        assert!(extract_json_object("no braces").is_none());
        assert!(extract_json_object("{ never closed").is_none());
    }

    #[tokio::test]
    async fn scripted_llm_serves_replies_then_goes_offline() {
        let llm = ScriptedLlm::with_replies(["first"]);
        let prompt = LlmPrompt::new("sys", "user");

        assert_eq!(llm.complete(&prompt).await.unwrap(), "first");
        assert!(matches!(
            llm.complete(&prompt).await,
            Err(LlmError::Unavailable(_))
        ));
        assert_eq!(llm.call_count(), 2);
    }
}
