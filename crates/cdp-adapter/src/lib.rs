//! Browser driver port for uitestgen.
//!
//! Higher layers (page inspector, self-healer, visual comparator) only see the
//! [`BrowserDriver`] / [`PageHandle`] traits. Three implementations live here:
//!
//! - [`ChromiumDriver`]: drives a headless Chromium over the DevTools protocol.
//! - [`fixture::FixtureDriver`]: serves canned pages for tests and dry runs.
//! - [`DriverPool`]: bounds how many pages may be open at once over any driver.

pub mod chromium;
pub mod config;
pub mod driver;
pub mod error;
pub mod fixture;
pub mod pool;
mod scripts;
pub mod selector;

pub use chromium::ChromiumDriver;
pub use config::CdpConfig;
pub use driver::{BrowserDriver, CaptureTarget, PageHandle};
pub use error::{AdapterError, AdapterErrorKind};
pub use pool::DriverPool;
pub use selector::SelectorQuery;
