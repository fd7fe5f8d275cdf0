use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use super::context::CliContext;
use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::{init_logging, load_config, load_local_env_overrides, LoadedConfig};

pub async fn run() -> Result<()> {
    load_local_env_overrides();
    let cli = CliArgs::parse();

    init_logging(&cli.log_level, cli.debug, cli.log_format)?;

    info!("Starting uitestgen v{}", env!("CARGO_PKG_VERSION"));

    let LoadedConfig { config, path } = load_config(cli.config.as_ref()).await?;
    let ctx = CliContext::new(config, path, &cli);

    match dispatch(&cli, &ctx).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            Err(err)
        }
    }
}
