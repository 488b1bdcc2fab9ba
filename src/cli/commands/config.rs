//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::cli::commands::{CHECK, WARN};
use crate::config::{Config, ConfigManager};
use crate::error::{ShellError, ShellResult};
use console::style;
use std::path::PathBuf;

const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "origin.base_url",
    "origin.timeout_secs",
    "cache.version",
    "cache.manifest",
    "cache.only_cache_ok",
    "cache.skip_waiting_on_install",
    "storage.dir",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, manager: &ConfigManager, config: &Config) -> ShellResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => {
            manager.init(force).await?;
            println!(
                "{} Configuration initialized at {}",
                CHECK,
                style(manager.path().display()).dim()
            );
        }
        Some(ConfigAction::Set { key, value }) => {
            let mut config = config.clone();
            if !set_value(&mut config, &key, &value)? {
                println!("{} Unknown config key: {}", WARN, style(&key).yellow());
                println!("Valid keys:");
                for key in VALID_KEYS {
                    println!("  {}", key);
                }
                return Ok(());
            }
            manager.save(&config).await?;
            println!("{} Set {} = {}", CHECK, key, value);
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> ShellResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Apply `key = value`; returns false for an unknown key
fn set_value(config: &mut Config, key: &str, value: &str) -> ShellResult<bool> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => config.general.log_format = value.to_string(),

        ["origin", "base_url"] => config.origin.base_url = value.to_string(),
        ["origin", "timeout_secs"] => config.origin.timeout_secs = parse_u64(value)?,

        ["cache", "version"] => config.cache.version = value.to_string(),
        ["cache", "manifest"] => {
            config.cache.manifest = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        ["cache", "only_cache_ok"] => config.cache.only_cache_ok = parse_bool(value)?,
        ["cache", "skip_waiting_on_install"] => {
            config.cache.skip_waiting_on_install = parse_bool(value)?
        }

        ["storage", "dir"] => config.storage.dir = Some(PathBuf::from(value)),

        _ => return Ok(false),
    }

    Ok(true)
}

fn parse_bool(value: &str) -> ShellResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ShellError::Internal(format!(
            "Invalid boolean value: {}",
            value
        ))),
    }
}

fn parse_u64(value: &str) -> ShellResult<u64> {
    value
        .parse()
        .map_err(|_| ShellError::Internal(format!("Invalid number: {}", value)))
}
