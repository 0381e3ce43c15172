//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::secrets::read_secret;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment variable {name}: {reason}")]
    Env { name: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment, then secrets.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env(&mut config, |name| std::env::var(name).ok())?;

    if let Some(db) = config.database.as_mut() {
        if db.password.is_none() {
            db.password = read_secret("db_password");
        }
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `REDIS_HOST`/`REDIS_PORT` configure the cache and `DB_HOST`/`DB_PORT`/
/// `DB_USER`/`DB_NAME` the durable store, creating the section when absent.
pub fn apply_env<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addr) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
    if let Some(key) = lookup("COUNTER_KEY") {
        config.counter.key = key;
    }
    if let Some(path) = lookup("CONFIG_FILE") {
        config.app.settings_file = path;
    }

    if let Some(host) = lookup("REDIS_HOST") {
        config.cache.get_or_insert_with(Default::default).host = host;
    }
    if let Some(port) = lookup("REDIS_PORT") {
        config.cache.get_or_insert_with(Default::default).port = parse_port("REDIS_PORT", &port)?;
    }

    if let Some(host) = lookup("DB_HOST") {
        config.database.get_or_insert_with(Default::default).host = host;
    }
    if let Some(port) = lookup("DB_PORT") {
        config.database.get_or_insert_with(Default::default).port = parse_port("DB_PORT", &port)?;
    }
    if let Some(user) = lookup("DB_USER") {
        config.database.get_or_insert_with(Default::default).user = user;
    }
    if let Some(name) = lookup("DB_NAME") {
        config.database.get_or_insert_with(Default::default).name = name;
    }

    Ok(())
}

fn parse_port(name: &'static str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Env {
        name,
        reason: e.to_string(),
    })
}

/// Load the public settings blob. Missing or malformed files yield `{}`.
pub fn load_settings(path: &Path) -> serde_json::Value {
    let empty = || serde_json::Value::Object(Default::default());
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = ?path, error = %e, "Settings file is not valid JSON");
            empty()
        }),
        Err(e) => {
            tracing::info!(path = ?path, error = %e, "Settings file not found");
            empty()
        }
    }
}
