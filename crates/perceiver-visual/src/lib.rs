//! Visual comparator for the uitestgen agent.
//!
//! - Screenshot capture through the shared browser driver
//! - Baseline storage per named check
//! - Anti-aliasing aware perceptual diff with a diff image on failure

pub mod comparator;
pub mod diff;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod storage;

pub use comparator::VisualComparator;
pub use diff::{compare_png, DiffOutcome};
pub use errors::VisualError;
pub use models::*;
pub use storage::BaselineStore;
