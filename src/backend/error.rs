//! Backend error definitions.

use thiserror::Error;

/// Errors that can occur while talking to a dependent backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Probe or connection failure.
    #[error("{backend} unreachable: {reason}")]
    Unreachable { backend: String, reason: String },

    /// Increment or insert failure.
    #[error("{backend} write failed: {reason}")]
    WriteFailed { backend: String, reason: String },

    /// Read of the grouped visit statistics failed.
    #[error("visit aggregate unavailable: {0}")]
    AggregateUnavailable(String),

    /// The backend did not answer within its client timeout.
    #[error("{backend} timed out after {secs} seconds")]
    Timeout { backend: String, secs: u64 },
}

impl BackendError {
    pub fn unreachable(backend: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unreachable {
            backend: backend.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write_failed(backend: impl Into<String>, reason: impl ToString) -> Self {
        Self::WriteFailed {
            backend: backend.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error says the backend could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Timeout { .. })
    }
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BackendError::unreachable("redis", "connection refused");
        assert_eq!(err.to_string(), "redis unreachable: connection refused");

        let err = BackendError::AggregateUnavailable("durable store not configured".into());
        assert_eq!(err.to_string(), "visit aggregate unavailable: durable store not configured");

        let err = BackendError::Timeout { backend: "redis".into(), secs: 2 };
        assert!(err.is_connectivity());
        assert!(!BackendError::write_failed("postgres", "constraint").is_connectivity());
    }
}
