//! Counter result types.

use serde::Serialize;

use crate::backend::{HostVisits, VisitAggregate};

/// Outcome of one increment-and-record call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IncrementOutcome {
    /// New cache total, 0 when the cache step was skipped or failed.
    pub cache_total: i64,
    /// Whether a durable visit row was written.
    pub recorded: bool,
}

/// Increment result enriched with the durable aggregate.
///
/// Serializes as `{count, hostname}` plus `{total_visits, visits_by_host}`
/// when the aggregate could be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitSnapshot {
    pub count: i64,
    pub hostname: String,
    #[serde(skip)]
    pub recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_visits: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visits_by_host: Option<Vec<HostVisits>>,
}

impl VisitSnapshot {
    pub fn new(outcome: IncrementOutcome, hostname: &str, aggregate: Option<VisitAggregate>) -> Self {
        let (total_visits, visits_by_host) = match aggregate {
            Some(agg) => (Some(agg.total_count), Some(agg.breakdown)),
            None => (None, None),
        };
        Self {
            count: outcome.cache_total,
            hostname: hostname.to_string(),
            recorded: outcome.recorded,
            total_visits,
            visits_by_host,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_only_shape() {
        let outcome = IncrementOutcome { cache_total: 4, recorded: false };
        let json = serde_json::to_value(VisitSnapshot::new(outcome, "web-1", None)).unwrap();
        assert_eq!(json, serde_json::json!({"count": 4, "hostname": "web-1"}));
    }

    #[test]
    fn test_durable_shape() {
        let outcome = IncrementOutcome { cache_total: 2, recorded: true };
        let agg = VisitAggregate {
            total_count: 2,
            breakdown: vec![HostVisits { hostname: "web-1".into(), count: 2 }],
        };
        let json = serde_json::to_value(VisitSnapshot::new(outcome, "web-1", Some(agg))).unwrap();
        assert_eq!(json["total_visits"], 2);
        assert_eq!(json["visits_by_host"][0]["hostname"], "web-1");
        assert_eq!(json["visits_by_host"][0]["count"], 2);
    }
}
