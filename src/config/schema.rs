//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the visit counter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration for the HTTP layer.
    pub timeouts: TimeoutConfig,

    /// Counter key settings.
    pub counter: CounterConfig,

    /// Cache backend. `None` means not configured.
    pub cache: Option<CacheConfig>,

    /// Durable backend. `None` means not configured.
    pub database: Option<DatabaseConfig>,

    /// Background probe settings.
    pub health: HealthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Public application settings shown on the info routes.
    pub app: AppSettingsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Timeout configuration for the HTTP layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Cache key holding the visit counter.
    pub key: String,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            key: "visit_count".to_string(),
        }
    }
}

/// Which client implementation backs a configured backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendDriver {
    Redis,
    Postgres,
    Memory,
}

/// Cache (Redis) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// `redis` or `memory`.
    pub driver: BackendDriver,

    pub host: String,

    pub port: u16,

    /// Logical database index.
    pub database: i64,

    /// Per-command timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            driver: BackendDriver::Redis,
            host: "redis".to_string(),
            port: 6379,
            database: 0,
            timeout_secs: 2,
        }
    }
}

impl CacheConfig {
    /// Connection URL understood by the Redis client.
    pub fn connection_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.database)
    }
}

/// Durable store (Postgres) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `postgres` or `memory`.
    pub driver: BackendDriver,

    pub host: String,

    pub port: u16,

    pub user: String,

    /// Database name.
    pub name: String,

    /// Usually loaded from the `db_password` secret. Never serialized.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// Pool acquire timeout in seconds; bounds every durable call.
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: BackendDriver::Postgres,
            host: "postgres".to_string(),
            port: 5432,
            user: "appuser".to_string(),
            name: "appdb".to_string(),
            password: None,
            max_connections: 5,
            acquire_timeout_secs: 3,
        }
    }
}

impl DatabaseConfig {
    /// Connection target without credentials, for logs and info routes.
    pub fn redacted_endpoint(&self) -> String {
        format!(
            "postgres://{}@{}:{}/{}",
            self.user, self.host, self.port, self.name
        )
    }
}

/// Background health probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Periodically re-probe backends to refresh availability.
    pub refresh_enabled: bool,

    /// Probe interval in seconds.
    pub refresh_interval_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            refresh_enabled: true,
            refresh_interval_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppSettingsConfig {
    /// JSON file with public settings, echoed by `/` and `/api/config`.
    pub settings_file: String,

    /// Message returned by the home route.
    pub message: String,

    /// Feature list returned by the home route.
    pub features: Vec<String>,
}

impl Default for AppSettingsConfig {
    fn default() -> Self {
        Self {
            settings_file: "/app/config.json".to_string(),
            message: "Docker Swarm Advanced Example".to_string(),
            features: vec![
                "Secrets".to_string(),
                "Configs".to_string(),
                "Volumes".to_string(),
                "Networks".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_leave_backends_unconfigured() {
        let config = AppConfig::default();
        assert!(config.cache.is_none());
        assert!(config.database.is_none());
        assert_eq!(config.counter.key, "visit_count");
        assert_eq!(config.listener.bind_address, "0.0.0.0:5000");
    }

    #[test]
    fn test_minimal_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [cache]
            host = "cache"

            [database]
            driver = "memory"
            "#,
        )
        .unwrap();

        let cache = config.cache.unwrap();
        assert_eq!(cache.driver, BackendDriver::Redis);
        assert_eq!(cache.connection_url(), "redis://cache:6379/0");
        assert_eq!(config.database.unwrap().driver, BackendDriver::Memory);
    }

    #[test]
    fn test_password_is_not_serialized() {
        let db = DatabaseConfig {
            password: Some("hunter2".to_string()),
            ..DatabaseConfig::default()
        };
        let rendered = serde_json::to_string(&db).unwrap();
        assert!(!rendered.contains("hunter2"));
        assert_eq!(db.redacted_endpoint(), "postgres://appuser@postgres:5432/appdb");
    }
}
