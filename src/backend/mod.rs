//! Dependent backend subsystem.
//!
//! # Data Flow
//! ```text
//! config (CacheConfig / DatabaseConfig)
//!     → redis.rs / postgres.rs / memory.rs (concrete clients)
//!     → handle.rs (BackendHandle: name, kind, endpoint, last-known availability)
//!     → counter (increment / record / aggregate)
//!     → health (uniform probe across kinds)
//! ```
//!
//! # Design Decisions
//! - Capabilities are traits so the core never sees a concrete client
//! - Every call is bounded by the backend's own client timeout
//! - Availability is a racy hint; the latest outcome wins

pub mod error;
pub mod handle;
pub mod memory;
pub mod postgres;
pub mod redis;
pub mod types;

use async_trait::async_trait;
use serde::Serialize;

pub use error::{BackendError, BackendResult};
pub use handle::{BackendHandle, BackendSlot, CacheHandle, Probe, ProbeOutcome, StoreHandle};
pub use memory::{MemoryCache, MemoryVisitLog};
pub use types::{HostVisits, VisitAggregate, VisitRecord};

/// The kind of a dependent backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Volatile key-value store holding the fast counter mirror.
    Cache,
    /// Relational store holding the visit history.
    DurableStore,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Cache => write!(f, "cache"),
            BackendKind::DurableStore => write!(f, "durable-store"),
        }
    }
}

/// Liveness capability shared by every dependent backend.
#[async_trait]
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Connection target with credentials redacted, safe to log.
    fn endpoint(&self) -> String;

    /// Single liveness probe. No retry.
    async fn ping(&self) -> BackendResult<()>;

    /// Release pooled connections. Called once at shutdown.
    async fn close(&self) {}
}

/// Counter capability of the cache backend.
#[async_trait]
pub trait CounterCache: Backend {
    /// Atomically increment `key` by one and return the new value.
    async fn incr(&self, key: &str) -> BackendResult<i64>;

    /// Current value of `key`, `None` when it has never been set.
    async fn get(&self, key: &str) -> BackendResult<Option<i64>>;
}

/// Visit history capability of the durable backend.
#[async_trait]
pub trait VisitLog: Backend {
    /// Create the visits table if it does not exist.
    async fn ensure_schema(&self) -> BackendResult<()>;

    /// Append one visit; id and timestamp are assigned by the store.
    async fn record(&self, origin_host: &str) -> BackendResult<VisitRecord>;

    /// Total visit count plus the per-host breakdown, read from one snapshot.
    async fn aggregate(&self) -> BackendResult<VisitAggregate>;
}
