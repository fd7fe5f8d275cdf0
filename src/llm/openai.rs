//! Chat-completions client (OpenAI and compatible servers).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uitest_core_types::{LlmBackend, LlmError, LlmPrompt};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_keys: Vec<String>,
    pub model: String,
    pub api_base: String,
    pub temperature: f32,
    pub timeout: Duration,
}

pub struct OpenAiLlmBackend {
    client: Client,
    config: OpenAiConfig,
    label: String,
}

impl OpenAiLlmBackend {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_keys.is_empty() {
            return Err(LlmError::Unavailable("missing OpenAI API key".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| LlmError::Request(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            label: format!("openai:{}", config.model),
            config,
        })
    }

    pub(crate) fn request_body(&self, prompt: &LlmPrompt) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiLlmBackend {
    fn name(&self) -> &str {
        &self.label
    }

    async fn complete(&self, prompt: &LlmPrompt) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));
        let body = self.request_body(prompt);

        let mut last_error: Option<LlmError> = None;
        for (index, key) in self.config.api_keys.iter().enumerate() {
            let response = match self.client.post(&url).bearer_auth(key).json(&body).send().await {
                Ok(resp) => resp,
                Err(err) if err.is_timeout() => return Err(LlmError::Timeout),
                Err(err) => {
                    last_error = Some(LlmError::Request(format!("openai request failed: {err}")));
                    continue;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<response unavailable>".to_string());
                if status.as_u16() == 429 && index + 1 < self.config.api_keys.len() {
                    let friendly = openai_rate_limit_message(&text);
                    warn!(
                        target: "openai",
                        message = %friendly,
                        attempt = index + 1,
                        remaining = self.config.api_keys.len() - index - 1,
                        "OpenAI rate limited request; switching API key"
                    );
                    last_error = Some(LlmError::Status {
                        status: status.as_u16(),
                        body: friendly,
                    });
                    continue;
                }
                return Err(LlmError::Status {
                    status: status.as_u16(),
                    body: text,
                });
            }

            let response: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|err| LlmError::Request(format!("openai response invalid: {err}")))?;
            if let Some(usage) = &response.usage {
                debug!(
                    target: "openai",
                    input_tokens = usage.prompt_tokens,
                    output_tokens = usage.completion_tokens,
                    "completion usage"
                );
            }
            return response
                .choices
                .first()
                .and_then(|choice| choice.message.content.as_ref())
                .and_then(ChatCompletionContent::as_text)
                .ok_or(LlmError::EmptyResponse);
        }

        Err(last_error.unwrap_or_else(|| LlmError::Unavailable("OpenAI request exhausted all API keys".to_string())))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<ChatCompletionContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatCompletionContent {
    Text(String),
    Parts(Vec<ChatCompletionPart>),
}

impl ChatCompletionContent {
    fn as_text(&self) -> Option<String> {
        let text = match self {
            ChatCompletionContent::Text(value) => value.clone(),
            ChatCompletionContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| part.text.as_ref())
                .cloned()
                .collect::<Vec<_>>()
                .join("\n"),
        };
        Some(text).filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorEnvelope {
    error: OpenAiErrorMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorMessage {
    message: Option<String>,
}

fn openai_rate_limit_message(raw: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<OpenAiErrorEnvelope>(raw) {
        if let Some(message) = envelope.error.message {
            return format!("OpenAI rate limit exceeded: {}", message.trim());
        }
    }
    "OpenAI rate limit exceeded; retry later or reduce usage".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> OpenAiLlmBackend {
        OpenAiLlmBackend::new(OpenAiConfig {
            api_keys: vec!["sk-test".into()],
            model: "gpt-4o-mini".into(),
            api_base: "http://127.0.0.1:9".into(),
            temperature: 0.0,
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn body_carries_system_and_user() {
        let body = serde_json::to_value(backend().request_body(&LlmPrompt::new("sys", "usr"))).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "usr");
    }

    #[test]
    fn content_parts_are_joined() {
        let raw = r#"{"choices":[{"message":{"content":[{"type":"text","text":"{\"a\":"},{"type":"text","text":"1}"}]}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let text = response.choices[0].message.content.as_ref().unwrap().as_text().unwrap();
        assert_eq!(text, "{\"a\":\n1}");
    }

    #[test]
    fn rate_limit_message_uses_envelope() {
        let message = openai_rate_limit_message(r#"{"error":{"message":" Slow down "}}"#);
        assert_eq!(message, "OpenAI rate limit exceeded: Slow down");
        assert!(openai_rate_limit_message("garbage").contains("retry later"));
    }

    #[test]
    fn requires_a_key() {
        let err = OpenAiLlmBackend::new(OpenAiConfig {
            api_keys: vec![],
            model: "m".into(),
            api_base: "http://localhost".into(),
            temperature: 0.0,
            timeout: Duration::from_secs(1),
        })
        .err()
        .unwrap();
        assert!(matches!(err, LlmError::Unavailable(_)));
    }
}
