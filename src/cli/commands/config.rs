//! Configuration management commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::cli::output::{OutputFormat, print_formatted, print_success};
use shelf::config::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Get a specific config value
    Get {
        /// Config key (e.g., "library.page_size", "bridge.data_dir")
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., "library.page_size", "bridge.data_dir")
        key: String,

        /// Value to set
        value: String,
    },

    /// Show config file path
    Path,
}

#[derive(Serialize)]
struct ConfigPathResult {
    path: String,
    exists: bool,
}

pub async fn run(command: ConfigCommands, format: OutputFormat, quiet: bool) -> Result<()> {
    match command {
        ConfigCommands::Show => show(format).await,
        ConfigCommands::Get { key } => get(&key, format).await,
        ConfigCommands::Set { key, value } => set(&key, &value, quiet).await,
        ConfigCommands::Path => path(format).await,
    }
}

async fn show(format: OutputFormat) -> Result<()> {
    let config = Config::load()?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            let toml = toml::to_string_pretty(&config)?;
            println!("{}", toml);
        }
    }

    Ok(())
}

async fn get(key: &str, format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let value = get_config_value(&config, key)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&value)?);
        }
        OutputFormat::Text => {
            println!("{}", value);
        }
    }

    Ok(())
}

fn get_config_value(config: &Config, key: &str) -> Result<String> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["library", "poll_interval_ms"] => Ok(config.library.poll_interval_ms.to_string()),
        ["library", "page_size"] => Ok(config.library.page_size.to_string()),
        ["bridge", "data_dir"] => Ok(config
            .bridge
            .data_dir
            .clone()
            .unwrap_or_else(|| "<not set>".to_string())),
        ["bridge", "installer_command"] => Ok(config.bridge.installer_command.join(" ")),
        ["onboarding", "extension_url"] => Ok(config.onboarding.extension_url.clone()),
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
}

async fn set(key: &str, value: &str, quiet: bool) -> Result<()> {
    let mut config = Config::load()?;

    set_config_value(&mut config, key, value)?;
    config.save()?;

    print_success(&format!("Set {} = {}", key, value), quiet);
    Ok(())
}

fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["library", "poll_interval_ms"] => {
            let millis: u64 = value.parse()?;
            if millis == 0 {
                anyhow::bail!("Poll interval must be at least 1 ms");
            }
            config.library.poll_interval_ms = millis;
        }
        ["library", "page_size"] => {
            let size: usize = value.parse()?;
            if size == 0 {
                anyhow::bail!("Page size must be at least 1");
            }
            config.library.page_size = size;
        }
        ["bridge", "data_dir"] => {
            config.bridge.data_dir = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            };
        }
        ["bridge", "installer_command"] => {
            config.bridge.installer_command =
                value.split_whitespace().map(str::to_string).collect();
        }
        ["onboarding", "extension_url"] => {
            config.onboarding.extension_url = value.to_string();
        }
        _ => anyhow::bail!("Unknown or read-only config key: {}", key),
    }

    Ok(())
}

async fn path(format: OutputFormat) -> Result<()> {
    let path = Config::config_path()?;
    let exists = path.exists();

    let result = ConfigPathResult {
        path: path.to_string_lossy().to_string(),
        exists,
    };

    print_formatted(&result, format, |r| {
        format!("{}{}", r.path, if r.exists { "" } else { " (not found)" })
    });

    Ok(())
}
