//! Dual-backed visit counter.
//!
//! # Data Flow
//! ```text
//! increment_and_record(key, host)
//!     ├─ cache: INCR key            (best effort, failure → cache_total = 0)
//!     └─ store: INSERT visit row    (best effort, failure → recorded = false)
//!
//! read_cache_total(key)    → GET key, 0 on any problem
//! read_durable_aggregate() → COUNT(*) + GROUP BY host, errors surfaced
//! ```
//!
//! # Design Decisions
//! - The two writes are independent; partial outcomes are expected
//! - Writes favor availability, aggregate reads favor correctness
//! - Increment atomicity is delegated to the cache's INCR

pub mod service;
pub mod types;

pub use service::DualBackedCounter;
pub use types::{IncrementOutcome, VisitSnapshot};
