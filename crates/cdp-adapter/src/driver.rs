//! The driver port every page-facing tool depends on.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uitest_core_types::{ElementInfo, PageFacts};

use crate::error::AdapterError;

/// What a screenshot covers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type", content = "selector")]
pub enum CaptureTarget {
    Viewport,
    FullPage,
    /// First element matching the selector.
    Element(String),
}

impl CaptureTarget {
    pub fn from_request(selector: Option<&str>, full_page: bool) -> Self {
        match selector.map(str::trim).filter(|s| !s.is_empty()) {
            Some(selector) => CaptureTarget::Element(selector.to_string()),
            None if full_page => CaptureTarget::FullPage,
            None => CaptureTarget::Viewport,
        }
    }
}

/// Launches pages. Implementations must be shareable across tasks.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate a fresh page to `url`, failing with
    /// [`crate::AdapterErrorKind::NavTimeout`] once `deadline` elapses.
    async fn open(&self, url: &str, deadline: Duration) -> Result<Box<dyn PageHandle>, AdapterError>;

    /// Deadline used when callers have no better bound.
    fn default_deadline(&self) -> Duration {
        Duration::from_secs(30)
    }
}

/// A loaded page.
#[async_trait]
pub trait PageHandle: Send + Sync {
    fn url(&self) -> &str;

    async fn title(&self) -> Result<Option<String>, AdapterError>;

    /// Buttons, links, inputs, ARIA-role elements and test-attribute carriers
    /// in DOM order; `index` is the position in that list.
    async fn interactive_elements(&self) -> Result<Vec<ElementInfo>, AdapterError>;

    async fn page_facts(&self) -> Result<PageFacts, AdapterError>;

    /// Number of elements the selector resolves to. Accepts CSS, `text=`
    /// and `role=` selectors (see [`crate::SelectorQuery`]).
    async fn count_matches(&self, selector: &str) -> Result<usize, AdapterError>;

    /// PNG-encoded screenshot.
    async fn screenshot(&self, target: &CaptureTarget) -> Result<Vec<u8>, AdapterError>;

    async fn close(&self) -> Result<(), AdapterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_target_prefers_selector() {
        assert_eq!(
            CaptureTarget::from_request(Some("#hero"), true),
            CaptureTarget::Element("#hero".into())
        );
        assert_eq!(CaptureTarget::from_request(Some("  "), true), CaptureTarget::FullPage);
        assert_eq!(CaptureTarget::from_request(None, false), CaptureTarget::Viewport);
    }
}
