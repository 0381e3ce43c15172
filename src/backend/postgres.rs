//! Postgres visit log.
//!
//! # Responsibilities
//! - Own a lazily-connected `PgPool`
//! - Create the visits table on first successful use
//! - Insert visits inside a short transaction
//! - Read the total and per-host breakdown from one snapshot
//!
//! Connections are scoped to a single call and go back to the pool when the
//! guard or transaction drops, including on error paths.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::backend::{
    Backend, BackendError, BackendKind, BackendResult, HostVisits, VisitAggregate, VisitLog,
    VisitRecord,
};
use crate::config::DatabaseConfig;

const BACKEND: &str = "postgres";

const CREATE_VISITS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS visits (
    id BIGSERIAL PRIMARY KEY,
    hostname VARCHAR(255) NOT NULL,
    observed_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

const INSERT_VISIT: &str =
    "INSERT INTO visits (hostname) VALUES ($1) RETURNING id, hostname, observed_at";

const COUNT_VISITS: &str = "SELECT COUNT(*) FROM visits";

const VISITS_BY_HOST: &str = r#"
SELECT hostname, COUNT(*) AS visit_count
FROM visits
GROUP BY hostname
ORDER BY visit_count DESC, MIN(id) ASC
"#;

/// Postgres-backed visit log.
#[derive(Debug, Clone)]
pub struct PostgresVisitLog {
    pool: PgPool,
    schema: Arc<OnceCell<()>>,
    endpoint: String,
}

impl PostgresVisitLog {
    /// Build the pool without connecting. The first query opens a connection.
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.name);
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);

        Self {
            pool,
            schema: Arc::new(OnceCell::new()),
            endpoint: config.redacted_endpoint(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Whether the visits table has been created by this process.
    pub fn schema_ready(&self) -> bool {
        self.schema.initialized()
    }

    /// Run the DDL once. A failed attempt leaves the cell empty, so the next
    /// call retries; this covers a database that was down at startup.
    async fn schema(&self) -> BackendResult<()> {
        self.schema
            .get_or_try_init(|| async {
                sqlx::query(CREATE_VISITS_TABLE)
                    .execute(&self.pool)
                    .await
                    .map_err(connect_error)?;
                tracing::info!(endpoint = %self.endpoint, "Visits table ready");
                Ok::<_, BackendError>(())
            })
            .await?;
        Ok(())
    }
}

fn connect_error(e: sqlx::Error) -> BackendError {
    match e {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => BackendError::unreachable(BACKEND, e),
        other => BackendError::write_failed(BACKEND, other),
    }
}

#[async_trait]
impl Backend for PostgresVisitLog {
    fn kind(&self) -> BackendKind {
        BackendKind::DurableStore
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn ping(&self) -> BackendResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| BackendError::unreachable(BACKEND, e))?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl VisitLog for PostgresVisitLog {
    async fn ensure_schema(&self) -> BackendResult<()> {
        self.schema().await
    }

    async fn record(&self, origin_host: &str) -> BackendResult<VisitRecord> {
        self.schema().await?;
        let mut tx = self.pool.begin().await.map_err(connect_error)?;
        let record: VisitRecord = sqlx::query_as(INSERT_VISIT)
            .bind(origin_host)
            .fetch_one(&mut *tx)
            .await
            .map_err(connect_error)?;
        tx.commit().await.map_err(connect_error)?;
        Ok(record)
    }

    async fn aggregate(&self) -> BackendResult<VisitAggregate> {
        let unavailable = |e: sqlx::Error| BackendError::AggregateUnavailable(e.to_string());
        self.schema()
            .await
            .map_err(|e| BackendError::AggregateUnavailable(e.to_string()))?;

        // Both reads share one snapshot so the breakdown sums to the total.
        let mut tx = self.pool.begin().await.map_err(unavailable)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        let total_count: i64 = sqlx::query_scalar(COUNT_VISITS)
            .fetch_one(&mut *tx)
            .await
            .map_err(unavailable)?;

        let rows: Vec<(String, i64)> = sqlx::query_as(VISITS_BY_HOST)
            .fetch_all(&mut *tx)
            .await
            .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)?;

        Ok(VisitAggregate {
            total_count,
            breakdown: rows
                .into_iter()
                .map(|(hostname, count)| HostVisits { hostname, count })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_is_lazy() {
        let config = DatabaseConfig {
            host: "db.invalid".to_string(),
            password: Some("secret".to_string()),
            ..DatabaseConfig::default()
        };
        let log = PostgresVisitLog::from_config(&config);
        assert_eq!(log.kind(), BackendKind::DurableStore);
        assert!(!log.endpoint().contains("secret"));
        assert_eq!(log.pool().size(), 0);
        assert!(!log.schema_ready());
    }

    #[tokio::test]
    async fn test_schema_retried_after_failure() {
        let config = DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            acquire_timeout_secs: 1,
            ..DatabaseConfig::default()
        };
        let log = PostgresVisitLog::from_config(&config);

        let err = log.record("h1").await.unwrap_err();
        assert!(err.is_connectivity());
        assert!(!log.schema_ready());
        assert!(matches!(
            log.aggregate().await,
            Err(BackendError::AggregateUnavailable(_))
        ));
        assert!(!log.schema_ready());
    }

    #[test]
    fn test_pool_timeout_is_connectivity() {
        assert!(connect_error(sqlx::Error::PoolTimedOut).is_connectivity());
        assert!(!connect_error(sqlx::Error::RowNotFound).is_connectivity());
    }
}
