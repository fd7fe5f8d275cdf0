//! Page inspector.
//!
//! Loads a live page through the driver port and condenses it into a
//! [`StructuralSnapshot`](uitest_core_types::StructuralSnapshot): the
//! interactive elements in DOM order plus structure and accessibility flags.

pub mod errors;
pub mod flags;
pub mod inspector;
pub mod metrics;

pub use errors::PerceiverError;
pub use inspector::{InspectRequest, InspectorConfig, PageInspector};
