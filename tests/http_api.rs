//! End-to-end tests against a running server with in-memory backends.

use serde_json::{json, Value};
use std::io::Write;

use visit_counter::config::{load_config, load_settings, BackendDriver};

mod common;

use common::{spawn_app, Backends};

async fn get_json(url: &str) -> (u16, Value) {
    let res = reqwest::get(url).await.unwrap();
    let status = res.status().as_u16();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn test_visits_are_counted_and_aggregated() {
    let app = spawn_app("h1", Backends::BOTH).await;

    for expected in 1..=2 {
        let (status, body) = get_json(&app.url("/")).await;
        assert_eq!(status, 200);
        assert_eq!(body["cache_count"], expected);
        assert_eq!(body["recorded"], true);
        assert_eq!(body["hostname"], "h1");
    }

    let (status, body) = get_json(&app.url("/api/stats")).await;
    assert_eq!(status, 200);
    assert_eq!(body["total_visits"], 2);
    assert_eq!(body["cache_count"], 2);
    assert_eq!(body["visits_by_host"], json!([{ "hostname": "h1", "count": 2 }]));

    app.stop().await;
}

#[tokio::test]
async fn test_count_includes_aggregate() {
    let app = spawn_app("web-7", Backends::BOTH).await;

    let (status, body) = get_json(&app.url("/api/count")).await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], 1);
    assert_eq!(body["hostname"], "web-7");
    assert_eq!(body["total_visits"], 1);
    assert_eq!(body["visits_by_host"][0]["hostname"], "web-7");

    app.stop().await;
}

#[tokio::test]
async fn test_health_degraded_when_store_down() {
    let app = spawn_app("h1", Backends::BOTH).await;
    app.store.set_online(false);

    let (status, body) = get_json(&app.url("/health")).await;
    assert_eq!(status, 503);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["redis"], "connected");
    assert_eq!(body["database"], "failed");

    app.store.set_online(true);
    let (status, body) = get_json(&app.url("/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");

    app.stop().await;
}

#[tokio::test]
async fn test_health_unhealthy_when_everything_down() {
    let app = spawn_app("h1", Backends::BOTH).await;
    app.cache.set_online(false);
    app.store.set_online(false);

    let (status, body) = get_json(&app.url("/health")).await;
    assert_eq!(status, 503);
    assert_eq!(body["status"], "unhealthy");

    app.stop().await;
}

#[tokio::test]
async fn test_nothing_configured_is_healthy() {
    let app = spawn_app("h1", Backends::NONE).await;

    let (status, body) = get_json(&app.url("/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["redis"], "not configured");
    assert_eq!(body["database"], "not configured");

    let (status, body) = get_json(&app.url("/")).await;
    assert_eq!(status, 200);
    assert_eq!(body["cache_count"], 0);
    assert_eq!(body["recorded"], false);

    let (status, _) = get_json(&app.url("/api/stats")).await;
    assert_eq!(status, 503);

    app.stop().await;
}

#[tokio::test]
async fn test_stats_unavailable_when_store_offline() {
    let app = spawn_app("h1", Backends::BOTH).await;
    app.store.set_online(false);

    let (status, body) = get_json(&app.url("/api/stats")).await;
    assert_eq!(status, 503);
    assert!(body["error"].is_string());

    let (status, body) = get_json(&app.url("/")).await;
    assert_eq!(status, 200);
    assert_eq!(body["recorded"], false);
    assert_eq!(body["cache_count"], 1);

    app.stop().await;
}

#[tokio::test]
async fn test_cache_outage_never_fails_a_visit() {
    let app = spawn_app("h1", Backends::BOTH).await;
    app.cache.set_online(false);

    let (status, body) = get_json(&app.url("/")).await;
    assert_eq!(status, 200);
    assert_eq!(body["cache_count"], 0);
    assert_eq!(body["recorded"], true);

    app.stop().await;
}

#[tokio::test]
async fn test_request_id_header() {
    let app = spawn_app("h1", Backends::BOTH).await;

    let res = reqwest::get(app.url("/health")).await.unwrap();
    let id = res.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(id.len(), 36);

    app.stop().await;
}

#[tokio::test]
async fn test_secrets_expose_presence_only() {
    let app = spawn_app("h1", Backends::BOTH).await;

    let (status, body) = get_json(&app.url("/api/secrets")).await;
    assert_eq!(status, 200);
    assert_eq!(body["db_password_exists"], false);
    assert_eq!(body["api_key_exists"], false);
    assert!(body["note"].is_string());

    let (status, body) = get_json(&app.url("/api/config")).await;
    assert_eq!(status, 200);
    assert_eq!(body["environment"]["has_db_password"], false);

    app.stop().await;
}

#[test]
fn test_config_file_and_settings_blob() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[listener]
bind_address = "127.0.0.1:5050"

[cache]
driver = "memory"

[database]
driver = "memory"
password = "from-file"
"#
    )
    .unwrap();

    let config = load_config(Some(file.path())).unwrap();
    assert_eq!(config.listener.bind_address, "127.0.0.1:5050");
    assert_eq!(config.cache.unwrap().driver, BackendDriver::Memory);
    assert_eq!(config.database.unwrap().password.as_deref(), Some("from-file"));

    let mut settings = tempfile::NamedTempFile::new().unwrap();
    write!(settings, r#"{{"theme": "dark"}}"#).unwrap();
    assert_eq!(load_settings(settings.path()), json!({ "theme": "dark" }));
}
