//! Configuration management commands.

use std::path::Path;

use clap::Args;
use ksm_core::config::Config;
use ksm_core::{paths, ConfigError};

/// Config command arguments.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration (file, then environment overrides)
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key (dot-separated path)
        key: String,
    },

    /// Set a configuration value in the config file
    Set {
        /// Configuration key
        key: String,

        /// Value to set
        value: String,
    },

    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration
    Validate,
}

/// Run the config command against `path` (or the default location).
pub async fn run(args: ConfigArgs, path: Option<&Path>) -> anyhow::Result<()> {
    let file = match path {
        Some(p) => p.to_path_buf(),
        None => paths::config_file()?,
    };

    match args.command {
        ConfigCommand::Show => {
            let config = Config::resolve(path)?;
            println!("{}", serde_json::to_string_pretty(&redacted(&config)?)?);
        }

        ConfigCommand::Get { key } => {
            let config = Config::resolve(path)?;
            let json = redacted(&config)?;
            match lookup(&json, &key) {
                Some(v) => println!("{}", serde_json::to_string_pretty(v)?),
                None => anyhow::bail!("Key not found: {}", key),
            }
        }

        ConfigCommand::Set { key, value } => {
            let config = load_file_or_default(&file)?;
            let updated = set_value(&config, &key, &value)?;
            updated.save(&file)?;
            println!("Set {} = {}", key, value);
        }

        ConfigCommand::Init { force } => {
            if file.exists() && !force {
                anyhow::bail!(
                    "Config file already exists: {}. Use --force to overwrite.",
                    file.display()
                );
            }
            Config::default().save(&file)?;
            println!("Created config file: {}", file.display());
        }

        ConfigCommand::Path => {
            println!("{}", file.display());
        }

        ConfigCommand::Validate => {
            let config = Config::resolve(path)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
            println!("Configuration is valid");
        }
    }

    Ok(())
}

fn load_file_or_default(file: &Path) -> anyhow::Result<Config> {
    match Config::load(file) {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound(_)) => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}

/// Serialize `config` with the store token masked.
fn redacted(config: &Config) -> anyhow::Result<serde_json::Value> {
    let mut json = serde_json::to_value(config)?;
    if let Some(token) = json.pointer_mut("/store/token") {
        *token = serde_json::Value::String("[REDACTED]".to_string());
    }
    Ok(json)
}

fn lookup<'a>(json: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    key.split('.').try_fold(json, |acc, k| acc.get(k))
}

/// Set a dot-separated key and check the result still fits the schema.
fn set_value(config: &Config, key: &str, value: &str) -> anyhow::Result<Config> {
    let mut json = serde_json::to_value(config)?;

    let parts: Vec<&str> = key.split('.').collect();
    let mut current = &mut json;
    for (i, part) in parts.iter().enumerate() {
        if i == parts.len() - 1 {
            // Numbers and booleans parse as JSON; anything else is a string.
            let parsed: serde_json::Value = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
            current[part] = parsed;
        } else {
            if !current.get(part).map_or(false, |v| v.is_object()) {
                current[part] = serde_json::json!({});
            }
            current = &mut current[part];
        }
    }

    serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Invalid configuration after set: {}", e))
}
