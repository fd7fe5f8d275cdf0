//! Self-healing of broken selectors.
//!
//! A broken selector is classified, candidate replacements are ranked from
//! the live page's interactive elements (LLM first, heuristic scoring as
//! fallback), the best candidate is verified against the page and only then
//! substituted into the source file after a timestamped backup.

pub mod classify;
pub mod errors;
pub mod healer;
pub mod metrics;
pub mod patch;
mod ranking;
pub mod strategies;
pub mod types;

pub use classify::classify;
pub use errors::LocatorError;
pub use healer::SelectorHealer;
pub use strategies::heuristic_candidates;
pub use types::{
    ClassifiedSelector, HealConfig, HealRequest, HealStatus, HealingResult, SelectorCandidate, SelectorKind,
};
