use std::env;
use std::fs as stdfs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

pub fn load_local_env_overrides() {
    let path = Path::new("config/local.env");
    if !path.exists() {
        return;
    }

    match stdfs::read_to_string(path) {
        Ok(contents) => {
            for (key, value) in parse_env_lines(&contents) {
                if env::var(&key).is_ok() {
                    continue;
                }
                env::set_var(key, value);
            }
            info!(path = %path.display(), "Loaded environment overrides from local.env");
        }
        Err(err) => {
            warn!(path = %path.display(), ?err, "failed to read local.env overrides");
        }
    }
}

/// `KEY=value` pairs; blank lines and `#` comments are skipped.
fn parse_env_lines(contents: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (idx, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            warn!(line = idx + 1, "invalid local.env entry; skipping");
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        pairs.push((key.to_string(), unescape_value(value.trim())));
    }
    pairs
}

/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_logging(level: &str, debug: bool, format: LogFormat) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let (text, json) = match format {
        LogFormat::Text => (Some(fmt::layer().with_writer(std::io::stderr)), None),
        LogFormat::Json => (None, Some(fmt::layer().json().with_writer(std::io::stderr))),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(())
}

pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
}

/// Priority: `--config` > `./config/uitestgen.yaml` > `<config_dir>/uitestgen/config.yaml`.
pub fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        return Ok(path.clone());
    }
    let local_config = PathBuf::from("config/uitestgen.yaml");
    if local_config.exists() {
        return Ok(local_config);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("uitestgen");
    path.push("config.yaml");
    Ok(path)
}

pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let config_path = resolve_config_path(config_path)?;

    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;
        info!("Loaded configuration from: {}", config_path.display());
        config
    } else {
        warn!("Config file not found, using defaults: {}", config_path.display());
        Config::default()
    };
    config.apply_env_overrides();

    Ok(LoadedConfig {
        config,
        path: config_path,
    })
}

fn unescape_value(value: &str) -> String {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        let inner = &value[1..value.len() - 1];
        inner
            .replace("\\\"", "\"")
            .replace("\\n", "\n")
            .replace("\\r", "\r")
            .replace("\\t", "\t")
    } else {
        value.to_string()
    }
}
