//! Self-healing of a broken selector against the live page.

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use cdp_adapter::{BrowserDriver, PageHandle};
use tracing::{debug, info, warn};
use uitest_core_types::{ElementInfo, LlmBackend, Tool, ToolFailure, ToolResult};

use crate::classify::classify;
use crate::errors::LocatorError;
use crate::metrics;
use crate::patch;
use crate::ranking;
use crate::strategies::heuristic_candidates;
use crate::types::{
    ClassifiedSelector, HealConfig, HealRequest, HealStatus, HealingResult, SelectorCandidate,
};

/// Repairs one broken selector in one source file.
///
/// Pre-checks run in order: the source must exist, the literal must still be
/// in it and the selector must no longer resolve. Only a candidate that
/// resolves on the live page is ever written back.
pub struct SelectorHealer {
    driver: Arc<dyn BrowserDriver>,
    llm: Option<Arc<dyn LlmBackend>>,
    cfg: HealConfig,
}

impl SelectorHealer {
    pub fn new(driver: Arc<dyn BrowserDriver>) -> Self {
        Self {
            driver,
            llm: None,
            cfg: HealConfig::default(),
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmBackend>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_config(mut self, cfg: HealConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn config(&self) -> &HealConfig {
        &self.cfg
    }

    pub async fn heal(&self, request: &HealRequest) -> Result<HealingResult, LocatorError> {
        let started = Instant::now();
        let outcome = self.heal_inner(request).await;
        metrics::record_heal(outcome.as_ref().ok().map(|result| result.status), started.elapsed());
        match &outcome {
            Ok(result) => info!(
                target: "action-locator",
                selector = %request.broken_selector,
                status = result.status.as_str(),
                new_selector = result.new_selector.as_deref().unwrap_or("-"),
                confidence = result.confidence,
                "heal finished"
            ),
            Err(err) => warn!(
                target: "action-locator",
                selector = %request.broken_selector,
                error = %err,
                "heal failed"
            ),
        }
        outcome
    }

    async fn heal_inner(&self, request: &HealRequest) -> Result<HealingResult, LocatorError> {
        let classified = classify(&request.broken_selector)?;
        debug!(
            target: "action-locator",
            kind = classified.kind.as_str(),
            intent = %classified.intent,
            "selector classified"
        );

        let contents = match tokio::fs::read_to_string(&request.source_file).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(LocatorError::SourceMissing(request.source_file.clone()))
            }
            Err(err) => return Err(LocatorError::io(&request.source_file, err)),
        };
        if !patch::contains_literal(&contents, &classified.raw) {
            return Ok(HealingResult::nothing_to_fix(
                &classified.raw,
                format!("'{}' no longer appears in {}", classified.raw, request.source_file.display()),
            ));
        }

        let page = self
            .driver
            .open(&request.target_url, self.cfg.navigation_timeout())
            .await?;
        let outcome = self.heal_on_page(page.as_ref(), request, &classified, &contents).await;
        if let Err(err) = page.close().await {
            debug!(target: "action-locator", error = %err, "page close failed");
        }
        outcome
    }

    async fn heal_on_page(
        &self,
        page: &dyn PageHandle,
        request: &HealRequest,
        classified: &ClassifiedSelector,
        contents: &str,
    ) -> Result<HealingResult, LocatorError> {
        let still_matching = page.count_matches(&classified.raw).await?;
        if still_matching > 0 {
            return Ok(HealingResult::nothing_to_fix(
                &classified.raw,
                format!("selector still resolves to {still_matching} element(s)"),
            ));
        }

        let elements = page.interactive_elements().await?;
        let mut candidates = self.rank(request, classified, &elements).await;
        candidates.retain(|candidate| {
            candidate.confidence >= self.cfg.min_confidence && candidate.selector != classified.raw
        });
        candidates.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        candidates.truncate(self.cfg.max_candidates);

        let mut result = HealingResult {
            status: HealStatus::NoVerifiedReplacement,
            original_selector: classified.raw.clone(),
            new_selector: None,
            confidence: 0,
            reasoning: String::new(),
            candidates: candidates.clone(),
            rejected: Vec::new(),
            backup_path: None,
            replacements: 0,
        };
        if candidates.is_empty() {
            result.reasoning = format!(
                "no candidate reached confidence {} among {} element(s)",
                self.cfg.min_confidence,
                elements.len()
            );
            return Ok(result);
        }

        let attempts = if self.cfg.cascade_candidates { candidates.len() } else { 1 };
        let mut verified: Option<(&SelectorCandidate, String)> = None;
        for candidate in candidates.iter().take(attempts) {
            let selector = patch::fit_to_literal(contents, &classified.raw, &candidate.selector);
            match page.count_matches(&selector).await {
                Ok(count) if count > 0 => {
                    verified = Some((candidate, selector));
                    break;
                }
                Ok(_) => {
                    debug!(target: "action-locator", %selector, "candidate matched nothing");
                    result.rejected.push(candidate.selector.clone());
                }
                Err(err) => {
                    debug!(target: "action-locator", %selector, error = %err, "candidate check failed");
                    result.rejected.push(candidate.selector.clone());
                }
            }
        }

        let Some((candidate, selector)) = verified else {
            result.reasoning = format!(
                "no verified replacement found; rejected: {}",
                result.rejected.join(", ")
            );
            return Ok(result);
        };

        let applied = patch::apply(&request.source_file, contents, &classified.raw, &selector).await?;
        result.status = HealStatus::Healed;
        result.new_selector = Some(selector);
        result.confidence = candidate.confidence;
        result.reasoning = candidate.reasoning.clone();
        result.backup_path = Some(applied.backup);
        result.replacements = applied.replacements;
        Ok(result)
    }

    async fn rank(
        &self,
        request: &HealRequest,
        classified: &ClassifiedSelector,
        elements: &[ElementInfo],
    ) -> Vec<SelectorCandidate> {
        if self.cfg.use_llm {
            if let Some(llm) = &self.llm {
                match ranking::rank(llm.as_ref(), request, classified, elements).await {
                    Ok(candidates) => {
                        debug!(target: "action-locator", backend = llm.name(), count = candidates.len(), "llm ranking");
                        return candidates;
                    }
                    Err(reason) => {
                        warn!(target: "action-locator", backend = llm.name(), %reason, "llm ranking unusable, scoring heuristically");
                        metrics::record_llm_fallback();
                    }
                }
            }
        }
        heuristic_candidates(classified, elements)
    }
}

#[async_trait]
impl Tool for SelectorHealer {
    type Input = HealRequest;
    type Output = HealingResult;

    fn name(&self) -> &'static str {
        "self_healing"
    }

    async fn call(&self, input: HealRequest) -> ToolResult<HealingResult> {
        self.heal(&input).await.map_err(ToolFailure::from)
    }
}
