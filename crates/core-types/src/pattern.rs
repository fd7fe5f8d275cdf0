//! Answers returned by the pattern repository.

use serde::{Deserialize, Serialize};

/// A fragment of reusable test code the answer was drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSource {
    pub path: String,
    pub snippet: String,
    /// Relevance in `0.0..=1.0`.
    pub score: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// `{answer, sources[]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAnswer {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<PatternSource>,
}

impl PatternAnswer {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Distinct tags across all sources, in first-seen order.
    pub fn tags(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for tag in self.sources.iter().flat_map(|source| source.tags.iter()) {
            if !seen.contains(&tag.as_str()) {
                seen.push(tag.as_str());
            }
        }
        seen
    }
}
