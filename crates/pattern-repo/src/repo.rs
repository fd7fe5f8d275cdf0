use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uitest_core_types::{
    LlmBackend, LlmPrompt, PatternAnswer, PatternSource, Tool, ToolFailure, ToolResult,
};

use crate::errors::PatternError;
use crate::index::{PatternIndex, ScoredEntry};
use crate::metrics;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub max_sources: usize,
    /// Hits scoring below this are ignored.
    pub min_score: f64,
    /// Ask the LLM to condense the sources into an answer.
    pub summarize: bool,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            max_sources: 5,
            min_score: 0.1,
            summarize: true,
        }
    }
}

impl PatternConfig {
    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources.max(1);
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_summarize(mut self, summarize: bool) -> Self {
        self.summarize = summarize;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternQuery {
    pub question: String,
}

impl PatternQuery {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }
}

const SUMMARY_SYSTEM: &str = "You summarise reusable UI test patterns. Answer in at most five \
sentences, naming helpers, fixtures and selector conventions found in the sources. Do not invent \
code that is not in the sources.";

/// `query(question) → {answer, sources[]}`.
pub struct PatternRepository {
    index: Arc<PatternIndex>,
    llm: Option<Arc<dyn LlmBackend>>,
    cfg: PatternConfig,
}

impl PatternRepository {
    pub fn new(index: PatternIndex) -> Self {
        Self {
            index: Arc::new(index),
            llm: None,
            cfg: PatternConfig::default(),
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmBackend>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_config(mut self, cfg: PatternConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn index(&self) -> &PatternIndex {
        &self.index
    }

    pub async fn query(&self, question: &str) -> Result<PatternAnswer, PatternError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PatternError::EmptyQuestion);
        }

        let hits = self.index.search(question, self.cfg.max_sources, self.cfg.min_score);
        metrics::record_query(hits.len());
        if hits.is_empty() {
            debug!(target: "pattern-repo", %question, indexed = self.index.len(), "no pattern matched");
            return Err(PatternError::NoMatches(question.to_string()));
        }

        let answer = match self.summarize(question, &hits).await {
            Some(answer) => answer,
            None => deterministic_answer(&hits),
        };
        info!(target: "pattern-repo", %question, sources = hits.len(), "patterns retrieved");

        Ok(PatternAnswer {
            question: question.to_string(),
            answer,
            sources: hits
                .into_iter()
                .map(|hit| PatternSource {
                    path: hit.entry.path,
                    snippet: hit.snippet,
                    score: hit.score,
                    tags: hit.entry.tags,
                })
                .collect(),
        })
    }

    async fn summarize(&self, question: &str, hits: &[ScoredEntry]) -> Option<String> {
        if !self.cfg.summarize {
            return None;
        }
        let llm = self.llm.as_ref()?;

        let mut user = format!("Question: {question}\n\nSources:\n");
        for hit in hits {
            user.push_str(&format!("--- {} (score {:.2})\n{}\n", hit.entry.path, hit.score, hit.snippet));
        }
        match llm.complete(&LlmPrompt::new(SUMMARY_SYSTEM, user)).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => None,
            Err(err) => {
                warn!(target: "pattern-repo", backend = llm.name(), error = %err, "summary failed; using listing");
                metrics::record_summary_fallback();
                None
            }
        }
    }
}

fn deterministic_answer(hits: &[ScoredEntry]) -> String {
    let mut lines = vec![format!("Found {} reusable pattern(s):", hits.len())];
    for hit in hits {
        let tags = if hit.entry.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", hit.entry.tags.join(", "))
        };
        lines.push(format!("- {}{} (relevance {:.2})", hit.entry.path, tags, hit.score));
    }
    lines.join("\n")
}

#[async_trait]
impl Tool for PatternRepository {
    type Input = PatternQuery;
    type Output = PatternAnswer;

    fn name(&self) -> &'static str {
        "pattern_repository"
    }

    async fn call(&self, input: PatternQuery) -> ToolResult<PatternAnswer> {
        self.query(&input.question).await.map_err(ToolFailure::from)
    }
}
