//! Application configuration.
//!
//! Loaded from YAML by [`crate::cli::runtime::load_config`]; every section
//! falls back to its defaults so a partial file is valid.

use std::env;
use std::path::PathBuf;

use action_locator::HealConfig;
use agent_core::AgentLoopConfig;
use cdp_adapter::CdpConfig;
use perceiver_visual::VisualConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root under which `<team>/<feature>/` artifact directories are created.
    pub output_dir: PathBuf,
    pub llm: LlmSettings,
    pub browser: CdpConfig,
    pub agent: AgentLoopConfig,
    pub healing: HealConfig,
    pub visual: VisualConfig,
    pub patterns: PatternSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated-tests"),
            llm: LlmSettings::default(),
            browser: CdpConfig::default(),
            agent: AgentLoopConfig::default(),
            healing: HealConfig::default(),
            visual: VisualConfig::default(),
            patterns: PatternSettings::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// No model; every decision comes from deterministic fallbacks.
    #[default]
    None,
    /// OpenAI or any server speaking the chat-completions protocol.
    Openai,
    Anthropic,
}

impl LlmProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProviderKind::None => "none",
            LlmProviderKind::Openai => "openai",
            LlmProviderKind::Anthropic => "anthropic",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProviderKind,
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::None,
            model: None,
            api_key: None,
            api_base: None,
            temperature: 0.2,
            max_tokens: 2048,
            timeout_secs: 60,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSettings {
    /// JSON index (`[{path, content, tags}]`) or a directory of test sources.
    pub index_path: Option<PathBuf>,
    pub max_sources: Option<usize>,
}

impl Config {
    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| env::var(key).ok());
    }

    /// Apply overrides from `lookup`; blank values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|value| value.trim().to_string()).filter(|v| !v.is_empty());

        let vendor_key = match self.llm.provider {
            LlmProviderKind::Openai => get("OPENAI_API_KEY"),
            LlmProviderKind::Anthropic => get("ANTHROPIC_API_KEY"),
            LlmProviderKind::None => None,
        };
        if let Some(key) = get("UITESTGEN_LLM_API_KEY").or(vendor_key) {
            debug!("llm api key taken from environment");
            self.llm.api_key = Some(key);
        }
        if let Some(raw) = get("UITESTGEN_HEADLESS") {
            self.browser.headless = !matches!(raw.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off");
        }
        if let Some(dir) = get("UITESTGEN_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
    }

    /// Copy safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.llm.api_key.is_some() {
            copy.llm.api_key = Some("***".to_string());
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str(
            "llm:\n  provider: anthropic\n  model: claude-3-5-sonnet-latest\nhealing:\n  cascade_candidates: true\n",
        )
        .unwrap();
        assert_eq!(config.llm.provider, LlmProviderKind::Anthropic);
        assert_eq!(config.llm.max_tokens, 2048);
        assert!(config.healing.cascade_candidates);
        assert_eq!(config.healing.min_confidence, 50);
        assert_eq!(config.agent.max_steps, 10);
        assert_eq!(config.output_dir, PathBuf::from("generated-tests"));
    }

    #[test]
    fn vendor_key_follows_provider() {
        let mut config = Config::default();
        config.llm.provider = LlmProviderKind::Openai;
        config.apply_overrides_from(lookup(&[("OPENAI_API_KEY", "sk-openai"), ("ANTHROPIC_API_KEY", "sk-ant")]));
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-openai"));

        config.apply_overrides_from(lookup(&[("UITESTGEN_LLM_API_KEY", "sk-generic"), ("OPENAI_API_KEY", "sk-openai")]));
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-generic"));
    }

    #[test]
    fn browser_and_output_overrides() {
        let mut config = Config::default();
        config.apply_overrides_from(lookup(&[("UITESTGEN_HEADLESS", "off"), ("UITESTGEN_OUTPUT_DIR", "out/e2e"), ("OPENAI_API_KEY", "  ")]));
        assert!(!config.browser.headless);
        assert_eq!(config.output_dir, PathBuf::from("out/e2e"));
        assert_eq!(config.llm.api_key, None);
    }

    #[test]
    fn redaction_hides_key() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-secret".into());
        let yaml = serde_yaml::to_string(&config.redacted()).unwrap();
        assert!(!yaml.contains("sk-secret"));
        assert!(yaml.contains("***"));
    }
}
