use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Subcommand};
use serde_json::{json, Map, Value as JsonValue};
use tokio::fs;
use tracing::info;

use super::context::CliContext;
use super::output::emit;
use crate::config::Config;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (file plus environment), secrets redacted
    Show,

    /// Set a value in the configuration file
    Set {
        /// Dotted key, e.g. `healing.cascade_candidates`
        key: String,

        /// JSON literal or plain string
        value: String,
    },

    /// Get an effective configuration value
    Get {
        /// Dotted key
        key: String,
    },

    /// Write the defaults to the configuration file
    Reset,

    /// Parse the configuration file without running anything
    Validate,

    /// Print the configuration file location
    Path,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    let path = ctx.config_path().to_path_buf();
    match args.action {
        ConfigAction::Show => {
            let config = ctx.config().redacted();
            emit(ctx.output(), &config, |config| {
                let body = serde_yaml::to_string(config).unwrap_or_default();
                format!("Current configuration ({}):\n{body}", path.display())
            })?;
        }
        ConfigAction::Set { key, value } => {
            let config = load_config_file(&path).await?;
            let mut doc = serde_json::to_value(&config)?;
            let segments = split_key(&key)?;
            set_json_value(&mut doc, &segments, parse_cli_value(&value))?;
            let updated: Config =
                serde_json::from_value(doc).with_context(|| format!("invalid value for {key}"))?;
            // serde drops unknown fields, so a key that does not survive the
            // round trip does not exist.
            if get_json_value(&serde_json::to_value(&updated)?, &segments).is_none() {
                bail!("{key} is not a configuration key");
            }
            save_config_file(&path, &updated).await?;
            info!(key = %key, path = %path.display(), "configuration updated");
            println!("Saved configuration to {}", path.display());
        }
        ConfigAction::Get { key } => {
            let doc = serde_json::to_value(ctx.config().redacted())?;
            let segments = split_key(&key)?;
            let value = get_json_value(&doc, &segments)
                .ok_or_else(|| anyhow!("{key} not found in configuration"))?;
            emit(ctx.output(), value, |value| match value {
                JsonValue::String(text) => text.clone(),
                other => other.to_string(),
            })?;
        }
        ConfigAction::Reset => {
            save_config_file(&path, &Config::default()).await?;
            println!("Configuration reset to defaults and written to {}", path.display());
        }
        ConfigAction::Validate => {
            if fs::try_exists(&path).await? {
                load_config_file(&path).await?;
                println!("Configuration file {} is valid", path.display());
            } else {
                println!("No configuration file at {}; defaults are valid", path.display());
            }
        }
        ConfigAction::Path => {
            let exists = fs::try_exists(&path).await?;
            emit(ctx.output(), &json!({ "path": path, "exists": exists }), |_| {
                path.display().to_string()
            })?;
        }
    }

    Ok(())
}

async fn load_config_file(path: &Path) -> Result<Config> {
    if fs::try_exists(path).await? {
        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    } else {
        Ok(Config::default())
    }
}

async fn save_config_file(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let serialized = serde_yaml::to_string(config)?;
    fs::write(path, serialized)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn parse_cli_value(raw: &str) -> JsonValue {
    serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

fn split_key(key: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = key.split('.').filter(|segment| !segment.is_empty()).collect();
    if segments.is_empty() {
        bail!("configuration key cannot be empty");
    }
    Ok(segments)
}

fn set_json_value(target: &mut JsonValue, path: &[&str], value: JsonValue) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        bail!("configuration key cannot be empty");
    };
    let mut current = target;
    for segment in parents {
        current = ensure_object(current, segment)?
            .entry((*segment).to_string())
            .or_insert(JsonValue::Null);
    }
    ensure_object(current, last)?.insert((*last).to_string(), value);
    Ok(())
}

fn ensure_object<'a>(value: &'a mut JsonValue, segment: &str) -> Result<&'a mut Map<String, JsonValue>> {
    if value.is_null() {
        *value = JsonValue::Object(Map::new());
    }
    match value {
        JsonValue::Object(map) => Ok(map),
        _ => bail!("{segment} resolves to a non-object value; cannot assign nested configuration"),
    }
}

fn get_json_value<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let mut current = value;
    for segment in path {
        match current {
            JsonValue::Object(map) => {
                current = map.get(*segment)?;
            }
            _ => return None,
        }
    }
    Some(current)
}
