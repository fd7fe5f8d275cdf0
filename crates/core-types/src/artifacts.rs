//! The three correlated files produced for every task.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactRole {
    /// Page abstraction (locators and actions).
    PageObject,
    /// Test data and scenario descriptors.
    TestData,
    /// Executable test specification.
    TestSpec,
}

impl ArtifactRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactRole::PageObject => "page-object",
            ArtifactRole::TestData => "test-data",
            ArtifactRole::TestSpec => "test-spec",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub role: ArtifactRole,
    /// Path relative to the feature directory.
    pub relative_path: String,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifacts {
    pub feature_name: String,
    pub page_object: Artifact,
    pub test_data: Artifact,
    pub test_spec: Artifact,
}

impl GeneratedArtifacts {
    /// Artifacts in write order.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        [&self.page_object, &self.test_data, &self.test_spec].into_iter()
    }

    pub fn total_bytes(&self) -> usize {
        self.iter().map(|artifact| artifact.contents.len()).sum()
    }
}
