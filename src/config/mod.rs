//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overlay (REDIS_*, DB_*, BIND_ADDRESS, CONFIG_FILE)
//!     → secrets.rs (db_password, api_key from /run/secrets)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never again
//! - All fields have defaults to allow minimal configs
//! - An absent `[cache]` or `[database]` section means "not configured"

pub mod loader;
pub mod schema;
pub mod secrets;
pub mod validation;

pub use loader::{load_config, load_settings, ConfigError};
pub use schema::{
    AppConfig, BackendDriver, CacheConfig, DatabaseConfig, HealthConfig, ListenerConfig,
    LogFormat, ObservabilityConfig,
};
pub use secrets::{read_secret, SecretPresence};
