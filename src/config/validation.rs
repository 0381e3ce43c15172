//! Configuration validation.
//!
//! Serde handles syntax; this checks values. All errors are collected so a
//! bad config reports everything at once.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{AppConfig, BackendDriver};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.counter.key.trim().is_empty() {
        errors.push(ValidationError::new("counter.key", "must not be empty"));
    }

    if let Some(cache) = &config.cache {
        if cache.driver == BackendDriver::Postgres {
            errors.push(ValidationError::new("cache.driver", "must be 'redis' or 'memory'"));
        }
        if cache.port == 0 {
            errors.push(ValidationError::new("cache.port", "must be non-zero"));
        }
        if cache.timeout_secs == 0 {
            errors.push(ValidationError::new("cache.timeout_secs", "must be greater than 0"));
        }
    }

    if let Some(db) = &config.database {
        if db.driver == BackendDriver::Redis {
            errors.push(ValidationError::new(
                "database.driver",
                "must be 'postgres' or 'memory'",
            ));
        }
        if db.port == 0 {
            errors.push(ValidationError::new("database.port", "must be non-zero"));
        }
        if db.max_connections == 0 {
            errors.push(ValidationError::new(
                "database.max_connections",
                "must be greater than 0",
            ));
        }
        if db.acquire_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "database.acquire_timeout_secs",
                "must be greater than 0",
            ));
        }
    }

    if config.health.refresh_enabled && config.health.refresh_interval_secs == 0 {
        errors.push(ValidationError::new(
            "health.refresh_interval_secs",
            "must be greater than 0",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "is not a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{CacheConfig, DatabaseConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.counter.key = "  ".to_string();
        config.cache = Some(CacheConfig {
            port: 0,
            ..CacheConfig::default()
        });
        config.database = Some(DatabaseConfig {
            driver: BackendDriver::Redis,
            max_connections: 0,
            ..DatabaseConfig::default()
        });

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "counter.key",
                "cache.port",
                "database.driver",
                "database.max_connections",
            ]
        );
    }
}
