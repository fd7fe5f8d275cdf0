//! Anthropic messages API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uitest_core_types::{LlmBackend, LlmError, LlmPrompt};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

pub struct ClaudeLlmBackend {
    client: Client,
    config: ClaudeConfig,
    label: String,
}

impl ClaudeLlmBackend {
    pub fn new(config: ClaudeConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| LlmError::Request(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            label: format!("anthropic:{}", config.model),
            config,
        })
    }

    fn request_body(&self, prompt: &LlmPrompt) -> ClaudeRequest {
        ClaudeRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            system: prompt.system.clone(),
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: vec![ClaudeContent {
                    _type: "text".to_string(),
                    text: prompt.user.clone(),
                }],
            }],
        }
    }
}

#[async_trait]
impl LlmBackend for ClaudeLlmBackend {
    fn name(&self) -> &str {
        &self.label
    }

    async fn complete(&self, prompt: &LlmPrompt) -> Result<String, LlmError> {
        let url = format!("{}/messages", self.config.api_base.trim_end_matches('/'));

        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Request(format!("claude request failed: {err}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let response: ClaudeResponse = response
            .json()
            .await
            .map_err(|err| LlmError::Request(format!("claude response invalid: {err}")))?;

        let content = response.text();
        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    temperature: f32,
    max_tokens: u32,
    system: String,
    messages: Vec<ClaudeMessage>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: String,
    content: Vec<ClaudeContent>,
}

#[derive(Debug, Serialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    _type: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeResponseContent>,
}

impl ClaudeResponse {
    /// Text blocks joined in order.
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|part| part._type == "text")
            .filter_map(|part| part.text.as_ref())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Deserialize)]
struct ClaudeResponseContent {
    #[serde(rename = "type")]
    _type: String,
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_top_level_system() {
        let backend = ClaudeLlmBackend::new(ClaudeConfig {
            api_key: "sk-ant".into(),
            model: "claude-3-5-sonnet-latest".into(),
            api_base: "http://127.0.0.1:9".into(),
            temperature: 0.2,
            max_tokens: 512,
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        let body = serde_json::to_value(backend.request_body(&LlmPrompt::new("sys", "usr"))).unwrap();
        assert_eq!(body["system"], "sys");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["messages"][0]["content"][0]["type"], "text");
        assert_eq!(backend.name(), "anthropic:claude-3-5-sonnet-latest");
    }

    #[test]
    fn response_ignores_non_text_blocks() {
        let response: ClaudeResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"{\"action\":"},{"type":"tool_use","id":"x"},{"type":"text","text":"\"done\"}"}]}"#,
        )
        .unwrap();
        assert_eq!(response.text(), "{\"action\":\n\"done\"}");
    }
}
