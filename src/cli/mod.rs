//! Command-line surface of the `uitestgen` binary.

pub mod app;
mod baseline;
mod check;
mod commands;
mod config;
mod context;
mod dispatch;
mod env;
mod generate;
mod heal;
pub mod output;
pub mod runtime;

pub use app::run;
pub use env::CliArgs;
