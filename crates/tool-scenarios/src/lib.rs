pub mod api;
pub mod errors;
pub mod model;

mod fallback;
mod prompt;

pub use api::{ScenarioGenerator, ScenarioGeneratorBuilder};
pub use errors::ScenarioParseError;
pub use model::{ScenarioConfig, ScenarioRequest};
