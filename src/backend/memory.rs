//! In-process backends.
//!
//! Selected with `driver = "memory"`. Both can be switched offline to
//! simulate an unreachable dependency.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::backend::{
    Backend, BackendError, BackendKind, BackendResult, CounterCache, HostVisits, VisitAggregate,
    VisitLog, VisitRecord,
};

/// Counter cache backed by a concurrent map.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    counters: Arc<DashMap<String, i64>>,
    online: Arc<AtomicBool>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(DashMap::new()),
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Drop every counter, as if the cache had been restarted.
    pub fn wipe(&self) {
        self.counters.clear();
    }

    fn ensure_online(&self) -> BackendResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::unreachable("memory-cache", "offline"))
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryCache {
    fn kind(&self) -> BackendKind {
        BackendKind::Cache
    }

    fn endpoint(&self) -> String {
        "memory://cache".to_string()
    }

    async fn ping(&self) -> BackendResult<()> {
        self.ensure_online()
    }
}

#[async_trait]
impl CounterCache for MemoryCache {
    async fn incr(&self, key: &str) -> BackendResult<i64> {
        self.ensure_online()?;
        let mut entry = self.counters.entry(key.to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    async fn get(&self, key: &str) -> BackendResult<Option<i64>> {
        self.ensure_online()?;
        Ok(self.counters.get(key).map(|v| *v.value()))
    }
}

/// Visit log kept in insertion order.
#[derive(Debug, Clone)]
pub struct MemoryVisitLog {
    rows: Arc<Mutex<Vec<VisitRecord>>>,
    online: Arc<AtomicBool>,
    schema: Arc<AtomicBool>,
}

impl MemoryVisitLog {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
            online: Arc::new(AtomicBool::new(true)),
            schema: Arc::new(AtomicBool::new(true)),
        }
    }

    /// A log whose table does not exist yet, like a fresh database.
    pub fn without_schema() -> Self {
        let log = Self::new();
        log.schema.store(false, Ordering::SeqCst);
        log
    }

    pub fn schema_ready(&self) -> bool {
        self.schema.load(Ordering::SeqCst)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_online(&self) -> BackendResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::unreachable("memory-store", "offline"))
        }
    }

    /// Create the table on first use, as the Postgres log does.
    fn ensure_table(&self) -> BackendResult<()> {
        self.ensure_online()?;
        if !self.schema.swap(true, Ordering::SeqCst) {
            tracing::info!("Memory visits table ready");
        }
        Ok(())
    }
}

impl Default for MemoryVisitLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryVisitLog {
    fn kind(&self) -> BackendKind {
        BackendKind::DurableStore
    }

    fn endpoint(&self) -> String {
        "memory://visits".to_string()
    }

    async fn ping(&self) -> BackendResult<()> {
        self.ensure_online()
    }
}

#[async_trait]
impl VisitLog for MemoryVisitLog {
    async fn ensure_schema(&self) -> BackendResult<()> {
        self.ensure_table()
    }

    async fn record(&self, origin_host: &str) -> BackendResult<VisitRecord> {
        self.ensure_table()?;
        let mut rows = self
            .rows
            .lock()
            .map_err(|e| BackendError::write_failed("memory-store", e))?;
        let record = VisitRecord {
            id: rows.len() as i64 + 1,
            origin_host: origin_host.to_string(),
            observed_at: Utc::now(),
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn aggregate(&self) -> BackendResult<VisitAggregate> {
        self.ensure_table()
            .map_err(|e| BackendError::AggregateUnavailable(e.to_string()))?;
        let rows = self
            .rows
            .lock()
            .map_err(|e| BackendError::AggregateUnavailable(e.to_string()))?;

        // Hosts are pushed in order of first appearance, so a stable sort
        // keeps that order among equal counts.
        let mut breakdown: Vec<HostVisits> = Vec::new();
        for row in rows.iter() {
            match breakdown.iter_mut().find(|h| h.hostname == row.origin_host) {
                Some(host) => host.count += 1,
                None => breakdown.push(HostVisits {
                    hostname: row.origin_host.clone(),
                    count: 1,
                }),
            }
        }
        breakdown.sort_by(|a, b| b.count.cmp(&a.count));

        Ok(VisitAggregate {
            total_count: rows.len() as i64,
            breakdown,
        })
    }
}
