//! Test scenarios proposed by the scenario generator.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioCategory {
    Smoke,
    Functional,
    Validation,
    Navigation,
    Accessibility,
    EdgeCase,
}

impl ScenarioCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioCategory::Smoke => "smoke",
            ScenarioCategory::Functional => "functional",
            ScenarioCategory::Validation => "validation",
            ScenarioCategory::Navigation => "navigation",
            ScenarioCategory::Accessibility => "accessibility",
            ScenarioCategory::EdgeCase => "edge-case",
        }
    }
}

impl fmt::Display for ScenarioCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioCategory {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "smoke" | "sanity" => Ok(ScenarioCategory::Smoke),
            "functional" | "happy-path" | "positive" => Ok(ScenarioCategory::Functional),
            "validation" | "negative" | "form-validation" => Ok(ScenarioCategory::Validation),
            "navigation" | "routing" => Ok(ScenarioCategory::Navigation),
            "accessibility" | "a11y" => Ok(ScenarioCategory::Accessibility),
            "edge-case" | "edge" | "boundary" => Ok(ScenarioCategory::EdgeCase),
            other => Err(format!("unknown scenario category '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl ScenarioPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioPriority::Critical => "critical",
            ScenarioPriority::High => "high",
            ScenarioPriority::Medium => "medium",
            ScenarioPriority::Low => "low",
        }
    }

    /// Short tag used in generated test titles (`@p0` .. `@p3`).
    pub fn tag(&self) -> &'static str {
        match self {
            ScenarioPriority::Critical => "@p0",
            ScenarioPriority::High => "@p1",
            ScenarioPriority::Medium => "@p2",
            ScenarioPriority::Low => "@p3",
        }
    }
}

impl fmt::Display for ScenarioPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioPriority {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" | "p0" | "blocker" => Ok(ScenarioPriority::Critical),
            "high" | "p1" => Ok(ScenarioPriority::High),
            "medium" | "p2" | "normal" => Ok(ScenarioPriority::Medium),
            "low" | "p3" | "minor" => Ok(ScenarioPriority::Low),
            other => Err(format!("unknown scenario priority '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub category: ScenarioCategory,
    pub priority: ScenarioPriority,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub expected: String,
    /// Indices of snapshot elements the scenario exercises.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub element_refs: Vec<usize>,
}

/// Scenarios of one task, grouped by category on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub scenarios: Vec<Scenario>,
    /// `true` when produced by the deterministic generator.
    #[serde(default)]
    pub from_fallback: bool,
}

impl ScenarioSet {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self {
            scenarios,
            from_fallback: false,
        }
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Scenarios grouped by category, each group ordered by priority.
    pub fn grouped(&self) -> BTreeMap<ScenarioCategory, Vec<&Scenario>> {
        let mut groups: BTreeMap<ScenarioCategory, Vec<&Scenario>> = BTreeMap::new();
        for scenario in &self.scenarios {
            groups.entry(scenario.category).or_default().push(scenario);
        }
        for group in groups.values_mut() {
            group.sort_by_key(|scenario| scenario.priority);
        }
        groups
    }

    pub fn count_by_priority(&self, priority: ScenarioPriority) -> usize {
        self.scenarios
            .iter()
            .filter(|scenario| scenario.priority == priority)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(id: &str, category: ScenarioCategory, priority: ScenarioPriority) -> Scenario {
        Scenario {
            id: id.to_string(),
            title: id.to_string(),
            category,
            priority,
            steps: Vec::new(),
            expected: String::new(),
            element_refs: Vec::new(),
        }
    }

    #[test]
    fn parses_loose_category_and_priority_labels() {
        assert_eq!("A11y".parse::<ScenarioCategory>(), Ok(ScenarioCategory::Accessibility));
        assert_eq!("edge_case".parse::<ScenarioCategory>(), Ok(ScenarioCategory::EdgeCase));
        assert_eq!("P1".parse::<ScenarioPriority>(), Ok(ScenarioPriority::High));
        assert!("urgent-ish".parse::<ScenarioPriority>().is_err());
    }

    #[test]
    fn grouping_orders_each_group_by_priority() {
        let set = ScenarioSet::new(vec![
            scenario("b", ScenarioCategory::Functional, ScenarioPriority::Low),
            scenario("a", ScenarioCategory::Smoke, ScenarioPriority::Critical),
            scenario("c", ScenarioCategory::Functional, ScenarioPriority::High),
        ]);

        let groups = set.grouped();
        let categories: Vec<_> = groups.keys().copied().collect();
        assert_eq!(categories, vec![ScenarioCategory::Smoke, ScenarioCategory::Functional]);
        let functional: Vec<_> = groups[&ScenarioCategory::Functional]
            .iter()
            .map(|scenario| scenario.id.as_str())
            .collect();
        assert_eq!(functional, vec!["c", "b"]);
    }
}
