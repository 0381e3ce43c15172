//! Visit history types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the durable visit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VisitRecord {
    /// Surrogate id assigned by the store.
    pub id: i64,
    /// Node that served the visit.
    #[sqlx(rename = "hostname")]
    #[serde(rename = "hostname")]
    pub origin_host: String,
    /// Insert time assigned by the store.
    pub observed_at: DateTime<Utc>,
}

/// Visit count for one origin host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostVisits {
    pub hostname: String,
    pub count: i64,
}

/// Aggregate view of the durable visit log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitAggregate {
    pub total_count: i64,
    /// Ordered by count descending, ties by first appearance of the host.
    pub breakdown: Vec<HostVisits>,
}

impl VisitAggregate {
    /// Sum of the per-host counts. Equals `total_count` for a consistent snapshot.
    pub fn breakdown_sum(&self) -> i64 {
        self.breakdown.iter().map(|h| h.count).sum()
    }
}
