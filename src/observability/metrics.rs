//! Metrics collection and exposition.
//!
//! # Metrics
//! - `visits_total` (counter): visits by cache/durable outcome (ok, skipped, failed)
//! - `backend_health` (gauge): 1=reachable, 0=unreachable, per backend
//! - `http_requests_total` (counter): requests by method, route, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// How one half of a visit went, for the `visits_total` labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Ok,
    /// Backend absent or last known unavailable; no call was made.
    Skipped,
    /// The call was made and failed.
    Failed,
}

impl StepOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepOutcome::Ok => "ok",
            StepOutcome::Skipped => "skipped",
            StepOutcome::Failed => "failed",
        }
    }
}

pub fn record_visit(cache: StepOutcome, durable: StepOutcome) {
    counter!(
        "visits_total",
        "cache" => cache.as_str(),
        "durable" => durable.as_str()
    )
    .increment(1);
}

pub fn record_backend_health(backend: &str, reachable: bool) {
    gauge!("backend_health", "backend" => backend.to_string()).set(if reachable { 1.0 } else { 0.0 });
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("http_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_outcome_labels() {
        assert_eq!(StepOutcome::Ok.as_str(), "ok");
        assert_eq!(StepOutcome::Skipped.as_str(), "skipped");
        assert_eq!(StepOutcome::Failed.as_str(), "failed");
    }
}
