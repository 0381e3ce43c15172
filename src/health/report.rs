//! Composite health report.

use serde::Serialize;

use crate::backend::BackendKind;

/// Folded status across all configured backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    /// Every configured backend answered its probe.
    Healthy,
    /// Some, but not all, configured backends failed.
    Degraded,
    /// Every configured backend failed.
    Unhealthy,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Healthy => "healthy",
            OverallStatus::Degraded => "degraded",
            OverallStatus::Unhealthy => "unhealthy",
        }
    }

    /// HTTP-equivalent status code: 200 when healthy, 503 otherwise.
    pub fn http_status(&self) -> u16 {
        match self {
            OverallStatus::Healthy => 200,
            _ => 503,
        }
    }
}

/// Per-backend probe result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BackendState {
    #[serde(rename = "connected")]
    Connected,
    #[serde(rename = "failed")]
    Failed,
    /// Configured, but no client could be built. Degrades like `Failed`.
    #[serde(rename = "disconnected")]
    Disconnected,
    /// Never configured. Does not degrade.
    #[serde(rename = "not configured")]
    NotConfigured,
}

impl BackendState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendState::Connected => "connected",
            BackendState::Failed => "failed",
            BackendState::Disconnected => "disconnected",
            BackendState::NotConfigured => "not configured",
        }
    }

    pub fn is_degrading(&self) -> bool {
        matches!(self, BackendState::Failed | BackendState::Disconnected)
    }

    fn is_configured(&self) -> bool {
        !matches!(self, BackendState::NotConfigured)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendStatus {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<BackendKind>,
    pub reachable: bool,
    pub state: BackendState,
    /// Free-form diagnostic.
    pub detail: String,
}

/// Result of one `check_all` pass. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: OverallStatus,
    pub backends: Vec<BackendStatus>,
}

impl HealthReport {
    /// Fold individual statuses into a report.
    pub fn from_statuses(backends: Vec<BackendStatus>) -> Self {
        let configured = backends.iter().filter(|b| b.state.is_configured()).count();
        let failed = backends.iter().filter(|b| b.state.is_degrading()).count();

        let status = if failed == 0 {
            OverallStatus::Healthy
        } else if failed == configured {
            OverallStatus::Unhealthy
        } else {
            OverallStatus::Degraded
        };

        Self { status, backends }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == OverallStatus::Healthy
    }

    pub fn http_status(&self) -> u16 {
        self.status.http_status()
    }

    pub fn backend(&self, name: &str) -> Option<&BackendStatus> {
        self.backends.iter().find(|b| b.name == name)
    }
}
