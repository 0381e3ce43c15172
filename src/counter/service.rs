//! Counter operations over the cache and durable handles.

use std::sync::Arc;

use crate::backend::{
    BackendError, BackendResult, BackendSlot, CacheHandle, CounterCache,
    StoreHandle, VisitAggregate, VisitLog,
};
use crate::counter::types::{IncrementOutcome, VisitSnapshot};
use crate::observability::metrics::{self, StepOutcome};

/// Visit counter mirrored between a volatile cache and a durable log.
///
/// Cheap to clone; holds only the backend handles.
#[derive(Clone, Default)]
pub struct DualBackedCounter {
    cache: Option<Arc<CacheHandle>>,
    store: Option<Arc<StoreHandle>>,
}

impl DualBackedCounter {
    pub fn new(cache: Option<Arc<CacheHandle>>, store: Option<Arc<StoreHandle>>) -> Self {
        Self { cache, store }
    }

    /// Build from configuration slots; disconnected slots count as absent.
    pub fn from_slots(
        cache: &BackendSlot<dyn CounterCache>,
        store: &BackendSlot<dyn VisitLog>,
    ) -> Self {
        Self::new(cache.handle().cloned(), store.handle().cloned())
    }

    pub fn has_durable_store(&self) -> bool {
        self.store.is_some()
    }

    /// Increment the cache counter and append a durable visit.
    ///
    /// Never fails. Each half reports its own outcome.
    pub async fn increment_and_record(&self, counter_key: &str, origin_host: &str) -> IncrementOutcome {
        let ((cache_step, cache_total), durable_step) = tokio::join!(
            self.increment_cache(counter_key),
            self.record_visit(origin_host)
        );

        metrics::record_visit(cache_step, durable_step);

        IncrementOutcome {
            cache_total: cache_total.unwrap_or(0),
            recorded: durable_step == StepOutcome::Ok,
        }
    }

    /// Current cache total, 0 when unavailable or never set.
    pub async fn read_cache_total(&self, counter_key: &str) -> i64 {
        let Some(cache) = self.cache.as_ref().filter(|c| c.is_available()) else {
            return 0;
        };

        let result = cache.backend().get(counter_key).await;
        cache.observe(&result);
        match result {
            Ok(value) => value.unwrap_or(0),
            Err(e) => {
                tracing::warn!(backend = %cache.name(), key = counter_key, error = %e, "Cache read failed");
                0
            }
        }
    }

    /// Total and per-host visit counts from the durable log.
    ///
    /// Attempted even when the handle is marked unavailable; the caller has
    /// no fallback for an aggregate, so failures are returned.
    pub async fn read_durable_aggregate(&self) -> BackendResult<VisitAggregate> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| BackendError::AggregateUnavailable("durable store not configured".to_string()))?;

        let result = store.backend().aggregate().await;
        match &result {
            Ok(_) => store.mark_available(),
            Err(e) => {
                store.mark_unavailable();
                tracing::warn!(backend = %store.name(), error = %e, "Visit aggregate unavailable");
            }
        }
        result.map_err(|e| match e {
            BackendError::AggregateUnavailable(_) => e,
            other => BackendError::AggregateUnavailable(other.to_string()),
        })
    }

    /// Increment, record, and attach the durable aggregate when readable.
    pub async fn visit_snapshot(&self, counter_key: &str, origin_host: &str) -> VisitSnapshot {
        let outcome = self.increment_and_record(counter_key, origin_host).await;
        let aggregate = if self.has_durable_store() {
            self.read_durable_aggregate().await.ok()
        } else {
            None
        };
        VisitSnapshot::new(outcome, origin_host, aggregate)
    }

    async fn increment_cache(&self, counter_key: &str) -> (StepOutcome, Option<i64>) {
        let Some(cache) = self.cache.as_ref().filter(|c| c.is_available()) else {
            return (StepOutcome::Skipped, None);
        };

        let result = cache.backend().incr(counter_key).await;
        cache.observe(&result);
        match result {
            Ok(total) => (StepOutcome::Ok, Some(total)),
            Err(e) => {
                tracing::warn!(backend = %cache.name(), key = counter_key, error = %e, "Cache increment failed");
                (StepOutcome::Failed, None)
            }
        }
    }

    async fn record_visit(&self, origin_host: &str) -> StepOutcome {
        let Some(store) = self.store.as_ref().filter(|s| s.is_available()) else {
            return StepOutcome::Skipped;
        };

        let result = store.backend().record(origin_host).await;
        store.observe(&result);
        match result {
            Ok(record) => {
                tracing::debug!(id = record.id, hostname = %record.origin_host, "Visit recorded");
                StepOutcome::Ok
            }
            Err(e) => {
                tracing::warn!(backend = %store.name(), error = %e, "Failed to record visit");
                StepOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HostVisits, MemoryCache, MemoryVisitLog};

    async fn counter_with(cache: &MemoryCache, store: &MemoryVisitLog) -> DualBackedCounter {
        let cache = CacheHandle::establish("redis", Arc::new(cache.clone()) as Arc<dyn CounterCache>).await;
        let store = StoreHandle::establish("database", Arc::new(store.clone()) as Arc<dyn VisitLog>).await;
        DualBackedCounter::new(Some(Arc::new(cache)), Some(Arc::new(store)))
    }

    #[tokio::test]
    async fn test_n_increments_read_back_n() {
        let cache = MemoryCache::new();
        let counter = counter_with(&cache, &MemoryVisitLog::new()).await;

        for expected in 1..=25 {
            let outcome = counter.increment_and_record("fresh", "h1").await;
            assert_eq!(outcome.cache_total, expected);
        }
        assert_eq!(counter.read_cache_total("fresh").await, 25);
        assert_eq!(counter.read_cache_total("never-set").await, 0);
    }

    #[tokio::test]
    async fn test_visits_scenario() {
        let store = MemoryVisitLog::new();
        let counter = counter_with(&MemoryCache::new(), &store).await;

        for host in ["h1", "h1", "h2"] {
            let outcome = counter.increment_and_record("visits", host).await;
            assert!(outcome.recorded);
        }

        assert_eq!(counter.read_cache_total("visits").await, 3);
        let agg = counter.read_durable_aggregate().await.unwrap();
        assert_eq!(agg.total_count, 3);
        assert_eq!(
            agg.breakdown,
            vec![
                HostVisits { hostname: "h1".into(), count: 2 },
                HostVisits { hostname: "h2".into(), count: 1 },
            ]
        );
        assert_eq!(agg.breakdown_sum(), agg.total_count);
    }

    #[tokio::test]
    async fn test_cache_down_never_fails() {
        let cache = MemoryCache::new();
        let store = MemoryVisitLog::new();
        let counter = counter_with(&cache, &store).await;

        cache.set_online(false);
        let outcome = counter.increment_and_record("visits", "h1").await;
        assert_eq!(outcome, IncrementOutcome { cache_total: 0, recorded: true });

        // Flag is now unavailable, so later calls skip the cache entirely.
        let outcome = counter.increment_and_record("visits", "h1").await;
        assert_eq!(outcome.cache_total, 0);
        assert_eq!(counter.read_cache_total("visits").await, 0);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_store_down_is_partial_outcome() {
        let cache = MemoryCache::new();
        let store = MemoryVisitLog::new();
        let counter = counter_with(&cache, &store).await;

        store.set_online(false);
        let outcome = counter.increment_and_record("visits", "h1").await;
        assert_eq!(outcome, IncrementOutcome { cache_total: 1, recorded: false });

        let err = counter.read_durable_aggregate().await.unwrap_err();
        assert!(matches!(err, BackendError::AggregateUnavailable(_)));
    }

    #[tokio::test]
    async fn test_aggregate_read_recovers_flag() {
        let store = MemoryVisitLog::new();
        let counter = counter_with(&MemoryCache::new(), &store).await;

        store.set_online(false);
        assert!(!counter.increment_and_record("visits", "h1").await.recorded);

        store.set_online(true);
        assert_eq!(counter.read_durable_aggregate().await.unwrap().total_count, 0);
        assert!(counter.increment_and_record("visits", "h1").await.recorded);
    }

    #[tokio::test]
    async fn test_step_outcomes_separate_failed_from_skipped() {
        let cache = MemoryCache::new();
        let store = MemoryVisitLog::new();
        let counter = counter_with(&cache, &store).await;

        assert_eq!(counter.increment_cache("visits").await, (StepOutcome::Ok, Some(1)));

        cache.set_online(false);
        store.set_online(false);
        assert_eq!(counter.increment_cache("visits").await, (StepOutcome::Failed, None));
        assert_eq!(counter.record_visit("h1").await, StepOutcome::Failed);

        // Flags are now unavailable, so the next attempt makes no call.
        assert_eq!(counter.increment_cache("visits").await, (StepOutcome::Skipped, None));
        assert_eq!(counter.record_visit("h1").await, StepOutcome::Skipped);

        let absent = DualBackedCounter::default();
        assert_eq!(absent.record_visit("h1").await, StepOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_nothing_configured() {
        let counter = DualBackedCounter::default();
        let outcome = counter.increment_and_record("visits", "h1").await;
        assert_eq!(outcome, IncrementOutcome { cache_total: 0, recorded: false });
        assert_eq!(counter.read_cache_total("visits").await, 0);
        assert!(matches!(
            counter.read_durable_aggregate().await,
            Err(BackendError::AggregateUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_visit_snapshot() {
        let counter = counter_with(&MemoryCache::new(), &MemoryVisitLog::new()).await;
        counter.visit_snapshot("visits", "h2").await;
        let snapshot = counter.visit_snapshot("visits", "h1").await;
        assert_eq!(snapshot.count, 2);
        assert_eq!(snapshot.total_visits, Some(2));
        assert_eq!(snapshot.visits_by_host.map(|v| v.len()), Some(2));

        let cache_only = DualBackedCounter::new(counter.cache.clone(), None);
        let snapshot = cache_only.visit_snapshot("visits", "h1").await;
        assert_eq!(snapshot.count, 3);
        assert!(snapshot.total_visits.is_none());
    }
}
