//! Response shaping and error mapping.
//!
//! # Design Decisions
//! - Backend outages map to 503, other backend errors to 500
//! - Error bodies are always `{"error": "..."}`
//! - The health body flattens per-backend states next to `status`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};

use crate::backend::BackendError;
use crate::health::HealthReport;

/// Error returned by API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        let status = match err {
            BackendError::WriteFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            BackendError::Unreachable { .. }
            | BackendError::AggregateUnavailable(_)
            | BackendError::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// `{status, hostname, <backend>: <state>, ...}`
pub fn health_body(report: &HealthReport, hostname: &str) -> Value {
    let mut body = Map::new();
    body.insert("status".to_string(), json!(report.status));
    body.insert("hostname".to_string(), json!(hostname));
    for backend in &report.backends {
        body.insert(backend.name.clone(), json!(backend.state));
    }
    Value::Object(body)
}

/// Health report as an HTTP response with the matching status code.
pub fn health_response(report: &HealthReport, hostname: &str) -> Response {
    let status = StatusCode::from_u16(report.http_status()).unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
    (status, Json(health_body(report, hostname))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;
    use crate::health::{BackendState, BackendStatus};

    #[test]
    fn test_error_status_mapping() {
        let err = ApiError::from(BackendError::AggregateUnavailable("refused".into()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let err = ApiError::from(BackendError::write_failed("postgres", "constraint"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_health_body_flattens_backends() {
        let report = HealthReport::from_statuses(vec![
            BackendStatus {
                name: "redis".into(),
                kind: Some(BackendKind::Cache),
                reachable: true,
                state: BackendState::Connected,
                detail: "connected".into(),
            },
            BackendStatus {
                name: "database".into(),
                kind: Some(BackendKind::DurableStore),
                reachable: false,
                state: BackendState::Failed,
                detail: "refused".into(),
            },
        ]);

        let body = health_body(&report, "web-1");
        assert_eq!(
            body,
            json!({
                "status": "degraded",
                "hostname": "web-1",
                "redis": "connected",
                "database": "failed",
            })
        );
        assert_eq!(health_response(&report, "web-1").status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
