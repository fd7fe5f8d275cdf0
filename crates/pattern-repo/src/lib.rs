//! Pattern repository.
//!
//! Answers "how do our existing tests already do X?" from a local index of
//! test sources. Retrieval is lexical; an optional LLM pass condenses the
//! retrieved sources into a short answer.

pub mod errors;
pub mod index;
pub mod metrics;
pub mod repo;

pub use errors::PatternError;
pub use index::{PatternEntry, PatternIndex};
pub use repo::{PatternConfig, PatternQuery, PatternRepository};
