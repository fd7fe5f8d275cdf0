use clap::Parser;
use std::path::PathBuf;

use super::commands::Commands;
use super::output::OutputFormat;
use super::runtime::LogFormat;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Enable debug mode (debug logs and metric snapshots)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    pub output: OutputFormat,

    /// Serve pages from a JSON fixture file instead of launching Chromium
    #[arg(long, value_name = "FILE", global = true)]
    pub fixture: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
