use serde::{Deserialize, Serialize};
use uitest_core_types::TaskId;

/// Immutable description of one generation task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationTask {
    pub id: TaskId,
    /// What the suite should cover, in the user's words.
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    pub feature_name: String,
    pub team: String,
    /// Overrides the question sent to the pattern repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_question: Option<String>,
}

impl GenerationTask {
    pub fn new(
        description: impl Into<String>,
        feature_name: impl Into<String>,
        team: impl Into<String>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            description: description.into(),
            target_url: None,
            feature_name: feature_name.into(),
            team: team.into(),
            pattern_question: None,
        }
    }

    pub fn with_target_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.target_url = Some(url).filter(|url| !url.trim().is_empty());
        self
    }

    pub fn with_pattern_question(mut self, question: impl Into<String>) -> Self {
        self.pattern_question = Some(question.into());
        self
    }

    /// Question asked of the pattern repository when the policy gives none.
    pub fn retrieval_question(&self) -> String {
        match &self.pattern_question {
            Some(question) => question.clone(),
            None => format!(
                "Existing tests, page objects and fixtures for {}: {}",
                self.feature_name, self.description
            ),
        }
    }
}
