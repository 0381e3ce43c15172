//! Health aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! check_all (aggregator.rs):
//!     For each target: not configured | disconnected | probe handle
//!     → BackendStatus per target
//!     → report.rs folds into HealthReport (healthy / degraded / unhealthy)
//!
//! Background refresh (monitor.rs):
//!     Periodic timer → check_all → availability flags updated
//! ```
//!
//! # Design Decisions
//! - Probes run concurrently, each bounded by its own client timeout
//! - No retry, no hysteresis: the latest probe wins
//! - Absent backends are reported but never degrade the status

pub mod aggregator;
pub mod monitor;
pub mod report;

pub use aggregator::{HealthAggregator, HealthTarget};
pub use monitor::HealthMonitor;
pub use report::{BackendState, BackendStatus, HealthReport, OverallStatus};
