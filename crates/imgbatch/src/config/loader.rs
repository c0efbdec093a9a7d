use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// Loads the config file (or defaults when none is given), then applies
/// environment overrides. A `.env` file in the working directory is honored.
pub fn load_with_env(path: Option<&Path>) -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();

    let config = match path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    let config = apply_env_overrides(config, |key| {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Overlays environment values onto `config`. `lookup` abstracts the
/// environment so callers can supply their own source.
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("APP_URL") {
        config.public_base_url = url;
    }
    if let Some(root) = lookup("IMGBATCH_STORAGE_ROOT") {
        config.storage_root = root;
    }
    if let Some(db) = lookup("IMGBATCH_DATABASE") {
        config.database_path = Some(db);
    }
    if let Some(raw) = lookup("IMGBATCH_INTERVAL_SECS") {
        config.scheduler.interval_secs =
            raw.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "IMGBATCH_INTERVAL_SECS".to_string(),
                value: raw.clone(),
            })?;
    }
    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.compression.quality > 100 {
        return Err(ConfigError::Validation {
            message: format!(
                "compression.quality must be 0-100, got {}",
                config.compression.quality
            ),
        });
    }

    if config.concurrency.downloads == 0 || config.concurrency.compressions == 0 {
        return Err(ConfigError::Validation {
            message: "concurrency limits must be at least 1".to_string(),
        });
    }

    if config.scheduler.interval_secs == 0 {
        return Err(ConfigError::Validation {
            message: "scheduler.interval_secs must be at least 1".to_string(),
        });
    }

    match url::Url::parse(&config.public_base_url) {
        Ok(url) if url.has_host() => {}
        _ => {
            return Err(ConfigError::Validation {
                message: format!("public_base_url is not a valid URL: {}", config.public_base_url),
            })
        }
    }

    Ok(())
}
