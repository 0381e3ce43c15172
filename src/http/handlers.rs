//! Route handlers. Each one is a thin call into the counter or the health
//! aggregator followed by JSON shaping.

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde_json::{json, Value};

use crate::counter::VisitSnapshot;
use crate::http::response::{health_response, ApiError};
use crate::lifecycle::AppContext;

/// `GET /`: count the visit in both backends.
pub async fn home(State(ctx): State<AppContext>) -> Json<Value> {
    let hostname = ctx.node.hostname();
    let outcome = ctx.counter.increment_and_record(ctx.counter_key(), hostname).await;

    Json(json!({
        "message": ctx.config.app.message,
        "hostname": hostname,
        "container_id": ctx.node.container_id(),
        "cache_count": outcome.cache_total,
        "recorded": outcome.recorded,
        "config": *ctx.settings,
        "features": ctx.config.app.features,
    }))
}

/// `GET /api/count`: increment and return the counter result.
pub async fn count(State(ctx): State<AppContext>) -> Json<VisitSnapshot> {
    Json(ctx.counter.visit_snapshot(ctx.counter_key(), ctx.node.hostname()).await)
}

/// `GET /api/stats`: durable aggregate plus the cache mirror.
pub async fn stats(State(ctx): State<AppContext>) -> Result<Json<Value>, ApiError> {
    let aggregate = ctx.counter.read_durable_aggregate().await?;
    let cache_count = ctx.counter.read_cache_total(ctx.counter_key()).await;

    Ok(Json(json!({
        "total_visits": aggregate.total_count,
        "cache_count": cache_count,
        "visits_by_host": aggregate.breakdown,
        "hostname": ctx.node.hostname(),
    })))
}

/// `GET /health`: composite status, 200 or 503.
pub async fn health(State(ctx): State<AppContext>) -> Response {
    let report = ctx.health.check_all().await;
    health_response(&report, ctx.node.hostname())
}

/// `GET /api/config`: public settings and connection summary, no secrets.
pub async fn app_config(State(ctx): State<AppContext>) -> Json<Value> {
    let cache = ctx.config.cache.as_ref();
    let db = ctx.config.database.as_ref();

    Json(json!({
        "config": *ctx.settings,
        "environment": {
            "REDIS_HOST": cache.map(|c| c.host.as_str()),
            "DB_HOST": db.map(|d| d.host.as_str()),
            "DB_USER": db.map(|d| d.user.as_str()),
            "database_endpoint": db.map(|d| d.redacted_endpoint()),
            "has_db_password": ctx.secrets.db_password,
            "has_api_key": ctx.secrets.api_key,
        }
    }))
}

/// `GET /api/secrets`: presence flags only.
pub async fn secrets(State(ctx): State<AppContext>) -> Json<Value> {
    Json(json!({
        "db_password_exists": ctx.secrets.db_password,
        "api_key_exists": ctx.secrets.api_key,
        "note": "Secret values are not exposed via API",
    }))
}
