//! Code generator: renders three correlated Playwright files per feature
//! (page object, test data, test spec) and persists them.

pub mod errors;
pub mod generator;
pub mod naming;
pub mod templates;
pub mod writer;

pub use errors::CodegenError;
pub use generator::{CodeGenerator, CodegenConfig, CodegenRequest};
pub use templates::preferred_selector;
pub use writer::{ArtifactWriter, FsArtifactWriter};
