//! Composite health checking.
//!
//! # Responsibilities
//! - Probe every configured backend, each independently
//! - Report absent backends without degrading
//! - Treat a configured backend with no usable client as failed
//! - Fold the results into one `HealthReport`

use futures_util::future::join_all;
use std::sync::Arc;

use crate::backend::{Backend, BackendSlot, Probe};
use crate::health::report::{BackendState, BackendStatus, HealthReport};
use crate::observability::metrics;

#[derive(Clone)]
enum TargetState {
    NotConfigured,
    Disconnected(String),
    Configured(Arc<dyn Probe>),
}

/// One named position in the health report.
#[derive(Clone)]
pub struct HealthTarget {
    name: String,
    state: TargetState,
}

impl HealthTarget {
    pub fn not_configured(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: TargetState::NotConfigured,
        }
    }

    pub fn disconnected(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: TargetState::Disconnected(reason.into()),
        }
    }

    pub fn configured(name: impl Into<String>, probe: Arc<dyn Probe>) -> Self {
        Self {
            name: name.into(),
            state: TargetState::Configured(probe),
        }
    }

    pub fn from_slot<B>(name: impl Into<String>, slot: &BackendSlot<B>) -> Self
    where
        B: Backend + ?Sized + 'static,
    {
        match slot {
            BackendSlot::NotConfigured => Self::not_configured(name),
            BackendSlot::Disconnected(reason) => Self::disconnected(name, reason.clone()),
            BackendSlot::Ready(handle) => Self::configured(name, handle.clone()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> BackendStatus {
        match &self.state {
            TargetState::NotConfigured => BackendStatus {
                name: self.name.clone(),
                kind: None,
                reachable: false,
                state: BackendState::NotConfigured,
                detail: BackendState::NotConfigured.as_str().to_string(),
            },
            TargetState::Disconnected(reason) => {
                metrics::record_backend_health(&self.name, false);
                BackendStatus {
                    name: self.name.clone(),
                    kind: None,
                    reachable: false,
                    state: BackendState::Disconnected,
                    detail: reason.clone(),
                }
            }
            TargetState::Configured(probe) => {
                let outcome = probe.probe().await;
                metrics::record_backend_health(&self.name, outcome.reachable);

                let (state, detail) = match outcome.error {
                    None => (BackendState::Connected, BackendState::Connected.as_str().to_string()),
                    Some(error) => {
                        tracing::warn!(backend = %self.name, error = %error, "Health probe failed");
                        (BackendState::Failed, error)
                    }
                };

                BackendStatus {
                    name: self.name.clone(),
                    kind: Some(probe.kind()),
                    reachable: outcome.reachable,
                    state,
                    detail,
                }
            }
        }
    }
}

/// Folds the health of every dependent backend into one report.
#[derive(Clone, Default)]
pub struct HealthAggregator {
    targets: Vec<HealthTarget>,
}

impl HealthAggregator {
    pub fn new(targets: Vec<HealthTarget>) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> &[HealthTarget] {
        &self.targets
    }

    /// Probe every target concurrently and fold the results.
    ///
    /// Never fails; probe failures become report data. Report order follows
    /// target order regardless of which probe finishes first.
    pub async fn check_all(&self) -> HealthReport {
        let statuses = join_all(self.targets.iter().map(|target| target.check())).await;
        let report = HealthReport::from_statuses(statuses);

        tracing::debug!(status = report.status.as_str(), "Health check complete");
        report
    }
}
