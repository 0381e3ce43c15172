//! Startup orchestration.
//!
//! # Responsibilities
//! - Build backend clients from configuration (init)
//! - Run the first probe and ensure the visits table (ready)
//! - Assemble the counter and health aggregator
//! - Close backends at shutdown (closed)
//!
//! # Design Decisions
//! - Unreachable backends are not fatal; they show up in the health report
//! - Schema creation failure is logged; the visit log retries it on first use

use std::sync::Arc;

use crate::backend::postgres::PostgresVisitLog;
use crate::backend::redis::RedisCache;
use crate::backend::{
    BackendHandle, BackendSlot, CounterCache, MemoryCache, MemoryVisitLog, VisitLog,
};
use crate::config::{
    load_settings, read_secret, AppConfig, BackendDriver, CacheConfig, DatabaseConfig,
    SecretPresence,
};
use crate::counter::DualBackedCounter;
use crate::health::{HealthAggregator, HealthTarget};
use crate::node::NodeIdentity;

/// Name of the cache in health reports.
pub const CACHE_NAME: &str = "redis";
/// Name of the durable store in health reports.
pub const DATABASE_NAME: &str = "database";

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub node: NodeIdentity,
    pub counter: DualBackedCounter,
    pub health: HealthAggregator,
    pub cache: BackendSlot<dyn CounterCache>,
    pub store: BackendSlot<dyn VisitLog>,
    pub settings: Arc<serde_json::Value>,
    pub secrets: SecretPresence,
}

impl AppContext {
    /// Assemble a context from already-built backend slots.
    pub fn assemble(
        config: AppConfig,
        node: NodeIdentity,
        cache: BackendSlot<dyn CounterCache>,
        store: BackendSlot<dyn VisitLog>,
    ) -> Self {
        let counter = DualBackedCounter::from_slots(&cache, &store);
        let health = HealthAggregator::new(vec![
            HealthTarget::from_slot(CACHE_NAME, &cache),
            HealthTarget::from_slot(DATABASE_NAME, &store),
        ]);
        let secrets = SecretPresence {
            db_password: config
                .database
                .as_ref()
                .is_some_and(|db| db.password.is_some()),
            api_key: false,
        };

        Self {
            config: Arc::new(config),
            node,
            counter,
            health,
            cache,
            store,
            settings: Arc::new(serde_json::json!({})),
            secrets,
        }
    }

    pub fn with_settings(mut self, settings: serde_json::Value) -> Self {
        self.settings = Arc::new(settings);
        self
    }

    pub fn with_secrets(mut self, secrets: SecretPresence) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn counter_key(&self) -> &str {
        &self.config.counter.key
    }

    /// Close every constructed backend.
    pub async fn close(&self) {
        if let Some(cache) = self.cache.handle() {
            cache.close().await;
        }
        if let Some(store) = self.store.handle() {
            store.close().await;
        }
    }
}

/// Build the full application context from configuration.
pub async fn bootstrap(config: AppConfig) -> AppContext {
    let node = NodeIdentity::detect();
    tracing::info!(hostname = %node.hostname(), "Node identity");

    let cache = build_cache(config.cache.as_ref()).await;
    let store = build_store(config.database.as_ref()).await;

    let settings = load_settings(std::path::Path::new(&config.app.settings_file));
    let api_key = read_secret("api_key").is_some();

    let context = AppContext::assemble(config, node, cache, store).with_settings(settings);
    let secrets = SecretPresence {
        api_key,
        ..context.secrets
    };
    context.with_secrets(secrets)
}

/// Build the cache slot. Never fails; problems become slot states.
pub async fn build_cache(config: Option<&CacheConfig>) -> BackendSlot<dyn CounterCache> {
    let Some(config) = config else {
        tracing::info!("Cache not configured");
        return BackendSlot::NotConfigured;
    };

    let backend: Arc<dyn CounterCache> = match config.driver {
        BackendDriver::Memory => Arc::new(MemoryCache::new()),
        _ => match RedisCache::from_config(config) {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                tracing::error!(error = %e, "Cache client could not be built");
                return BackendSlot::Disconnected(e.to_string());
            }
        },
    };

    BackendSlot::Ready(Arc::new(BackendHandle::establish(CACHE_NAME, backend).await))
}

/// Build the durable store slot and ensure its schema when reachable.
pub async fn build_store(config: Option<&DatabaseConfig>) -> BackendSlot<dyn VisitLog> {
    let Some(config) = config else {
        tracing::info!("Database not configured");
        return BackendSlot::NotConfigured;
    };

    let backend: Arc<dyn VisitLog> = match config.driver {
        BackendDriver::Memory => Arc::new(MemoryVisitLog::new()),
        _ => Arc::new(PostgresVisitLog::from_config(config)),
    };

    establish_store(backend).await
}

/// Probe the durable store and create its schema when it answers.
///
/// An unreachable store is still returned as ready; the schema is then
/// created by the first write or read after it comes back.
pub async fn establish_store(backend: Arc<dyn VisitLog>) -> BackendSlot<dyn VisitLog> {
    let handle = BackendHandle::establish(DATABASE_NAME, backend).await;
    if handle.is_available() {
        if let Err(e) = handle.backend().ensure_schema().await {
            tracing::error!(error = %e, "Database initialization failed");
        }
    }

    BackendSlot::Ready(Arc::new(handle))
}
