//! Vendor clients implementing [`LlmBackend`].

pub mod anthropic;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use uitest_core_types::LlmBackend;

use crate::config::{LlmProviderKind, LlmSettings};

pub use anthropic::{ClaudeConfig, ClaudeLlmBackend};
pub use openai::{OpenAiConfig, OpenAiLlmBackend};

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_CLAUDE_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_CLAUDE_BASE: &str = "https://api.anthropic.com/v1";

/// Backend for the configured provider.
///
/// `Ok(None)` means run offline: no provider, or a provider without a key.
pub fn build_backend(settings: &LlmSettings) -> Result<Option<Arc<dyn LlmBackend>>> {
    if settings.provider == LlmProviderKind::None {
        return Ok(None);
    }
    let Some(api_key) = settings.api_key.clone() else {
        warn!(
            provider = settings.provider.as_str(),
            "no api key configured; running with deterministic fallbacks"
        );
        return Ok(None);
    };
    let timeout = Duration::from_secs(settings.timeout_secs.max(1));

    let backend: Arc<dyn LlmBackend> = match settings.provider {
        LlmProviderKind::Openai => Arc::new(
            OpenAiLlmBackend::new(OpenAiConfig {
                // comma-separated keys rotate on rate limiting
                api_keys: api_key
                    .split(',')
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(str::to_string)
                    .collect(),
                model: settings.model.clone().unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                api_base: settings.api_base.clone().unwrap_or_else(|| DEFAULT_OPENAI_BASE.to_string()),
                temperature: settings.temperature,
                timeout,
            })
            .context("building OpenAI client")?,
        ),
        LlmProviderKind::Anthropic => Arc::new(
            ClaudeLlmBackend::new(ClaudeConfig {
                api_key,
                model: settings.model.clone().unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string()),
                api_base: settings.api_base.clone().unwrap_or_else(|| DEFAULT_CLAUDE_BASE.to_string()),
                temperature: settings.temperature,
                max_tokens: settings.max_tokens,
                timeout,
            })
            .context("building Anthropic client")?,
        ),
        LlmProviderKind::None => return Ok(None),
    };
    info!(backend = backend.name(), "llm backend ready");
    Ok(Some(backend))
}
