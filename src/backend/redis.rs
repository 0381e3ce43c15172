//! Redis counter cache.
//!
//! Uses `redis::aio::ConnectionManager` for a multiplexed connection with
//! automatic reconnection. The manager is created on first use, so a Redis
//! that is down at startup can still be picked up later.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::future::Future;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::timeout;

use crate::backend::{Backend, BackendError, BackendKind, BackendResult, CounterCache};
use crate::config::CacheConfig;

const BACKEND: &str = "redis";

/// Redis-backed counter cache.
pub struct RedisCache {
    client: redis::Client,
    manager: OnceCell<ConnectionManager>,
    endpoint: String,
    timeout: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RedisCache {
    /// Build the client. Does not open a connection.
    pub fn from_config(config: &CacheConfig) -> BackendResult<Self> {
        let url = config.connection_url();
        let client = redis::Client::open(url.as_str()).map_err(|e| {
            BackendError::unreachable(BACKEND, format!("invalid Redis endpoint: {}", e))
        })?;

        Ok(Self {
            client,
            manager: OnceCell::new(),
            endpoint: redact_url(&url),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    async fn connection(&self) -> BackendResult<ConnectionManager> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                let manager = self
                    .bounded(ConnectionManager::new(self.client.clone()))
                    .await?
                    .map_err(|e| BackendError::unreachable(BACKEND, e))?;
                tracing::debug!(endpoint = %self.endpoint, "Redis connection manager created");
                Ok::<_, BackendError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }

    async fn bounded<F: Future>(&self, fut: F) -> BackendResult<F::Output> {
        timeout(self.timeout, fut).await.map_err(|_| BackendError::Timeout {
            backend: BACKEND.to_string(),
            secs: self.timeout.as_secs(),
        })
    }
}

/// Map a command error to the backend taxonomy. Only transport failures
/// count as unreachable; a reply that does not parse leaves the flag alone.
fn command_error(e: redis::RedisError) -> BackendError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
        BackendError::unreachable(BACKEND, e)
    } else {
        BackendError::write_failed(BACKEND, e)
    }
}

#[async_trait]
impl Backend for RedisCache {
    fn kind(&self) -> BackendKind {
        BackendKind::Cache
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn ping(&self) -> BackendResult<()> {
        let mut conn = self.connection().await?;
        let pong: String = self
            .bounded(redis::cmd("PING").query_async(&mut conn))
            .await?
            .map_err(|e| BackendError::unreachable(BACKEND, e))?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(BackendError::unreachable(BACKEND, format!("unexpected PING reply: {}", pong)))
        }
    }
}

#[async_trait]
impl CounterCache for RedisCache {
    async fn incr(&self, key: &str) -> BackendResult<i64> {
        let mut conn = self.connection().await?;
        let total: i64 = self
            .bounded(redis::cmd("INCR").arg(key).query_async(&mut conn))
            .await?
            .map_err(command_error)?;

        tracing::debug!(key = key, total = total, "Redis INCR");
        Ok(total)
    }

    async fn get(&self, key: &str) -> BackendResult<Option<i64>> {
        let mut conn = self.connection().await?;
        let value: Option<i64> = self
            .bounded(redis::cmd("GET").arg(key).query_async(&mut conn))
            .await?
            .map_err(command_error)?;
        Ok(value)
    }
}

/// Redact credentials from a connection URL for logging.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.to_string()
        }
        _ => raw.to_string(),
    }
}
