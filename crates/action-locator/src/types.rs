use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uitest_core_types::ElementInfo;

/// Shape of a broken selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectorKind {
    Id,
    Class,
    TestAttribute,
    TextMatch,
    Complex,
}

impl SelectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorKind::Id => "id",
            SelectorKind::Class => "class",
            SelectorKind::TestAttribute => "test-attribute",
            SelectorKind::TextMatch => "text-match",
            SelectorKind::Complex => "complex",
        }
    }
}

/// Broken selector with the value the author meant to match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedSelector {
    pub raw: String,
    pub kind: SelectorKind,
    /// Id, class, test-attribute value or text the selector targeted.
    pub intent: String,
    /// Attribute name for [`SelectorKind::TestAttribute`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

/// Ranked replacement proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorCandidate {
    pub selector: String,
    /// 0..=100.
    pub confidence: u8,
    pub reasoning: String,
    pub element_info: ElementInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealRequest {
    pub target_url: String,
    pub broken_selector: String,
    pub source_file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_snippet: Option<String>,
}

impl HealRequest {
    pub fn new(
        target_url: impl Into<String>,
        broken_selector: impl Into<String>,
        source_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            target_url: target_url.into(),
            broken_selector: broken_selector.into(),
            source_file: source_file.into(),
            context_snippet: None,
        }
    }

    pub fn with_context(mut self, snippet: impl Into<String>) -> Self {
        self.context_snippet = Some(snippet.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealStatus {
    /// Source patched with a verified selector.
    Healed,
    /// Selector already absent from the source or still resolving.
    NothingToFix,
    /// No candidate survived verification; the source is untouched.
    NoVerifiedReplacement,
}

impl HealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealStatus::Healed => "healed",
            HealStatus::NothingToFix => "nothing-to-fix",
            HealStatus::NoVerifiedReplacement => "no-verified-replacement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealingResult {
    pub status: HealStatus,
    pub original_selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_selector: Option<String>,
    pub confidence: u8,
    pub reasoning: String,
    /// Candidates considered, best first.
    #[serde(default)]
    pub candidates: Vec<SelectorCandidate>,
    /// Candidate selectors that matched nothing on the live page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
    /// Occurrences of the old literal replaced in the source.
    #[serde(default)]
    pub replacements: usize,
}

impl HealingResult {
    pub(crate) fn nothing_to_fix(original: &str, reasoning: impl Into<String>) -> Self {
        Self {
            status: HealStatus::NothingToFix,
            original_selector: original.to_string(),
            new_selector: None,
            confidence: 0,
            reasoning: reasoning.into(),
            candidates: Vec::new(),
            rejected: Vec::new(),
            backup_path: None,
            replacements: 0,
        }
    }

    pub fn is_healed(&self) -> bool {
        self.status == HealStatus::Healed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealConfig {
    /// Try the 2nd and 3rd candidate when the top one fails verification.
    pub cascade_candidates: bool,
    pub max_candidates: usize,
    /// Candidates below this confidence are discarded before verification.
    pub min_confidence: u8,
    /// Rank with the LLM when one is attached.
    pub use_llm: bool,
    pub navigation_timeout_ms: u64,
}

impl Default for HealConfig {
    fn default() -> Self {
        Self {
            cascade_candidates: false,
            max_candidates: 3,
            min_confidence: 50,
            use_llm: true,
            navigation_timeout_ms: 30_000,
        }
    }
}

impl HealConfig {
    pub fn with_cascade(mut self, cascade: bool) -> Self {
        self.cascade_candidates = cascade;
        self
    }

    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max.max(1);
        self
    }

    pub fn with_min_confidence(mut self, min: u8) -> Self {
        self.min_confidence = min.min(100);
        self
    }

    pub fn with_llm(mut self, use_llm: bool) -> Self {
        self.use_llm = use_llm;
        self
    }

    pub fn with_navigation_timeout_ms(mut self, ms: u64) -> Self {
        self.navigation_timeout_ms = ms;
        self
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}
