use anyhow::Result;

use super::baseline::cmd_baseline;
use super::check::cmd_check;
use super::commands::Commands;
use super::config::cmd_config;
use super::context::CliContext;
use super::env::CliArgs;
use super::generate::cmd_generate;
use super::heal::cmd_heal;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Generate(args) => cmd_generate(args, ctx).await,
        Commands::Heal(args) => cmd_heal(args, ctx).await,
        Commands::Check(args) => cmd_check(args, ctx).await,
        Commands::Baseline(args) => cmd_baseline(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
    }
}
