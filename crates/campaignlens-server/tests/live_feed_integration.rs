/// BDD integration tests for the live source and its fallback to DuckDB.
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use campaignlens_core::config::{Config, LiveFeedConfig, Theme};
use campaignlens_core::record::MetricRecord;
use campaignlens_core::source::DataSource;
use campaignlens_duckdb::DuckDbBackend;
use campaignlens_server::app::build_app;
use campaignlens_server::state::AppState;

fn test_config(live_feed: Option<LiveFeedConfig>) -> Config {
    Config {
        port: 0,
        data_dir: "/tmp/campaignlens-test".to_string(),
        duckdb_memory_limit: "256MB".to_string(),
        default_source: DataSource::Local,
        live_feed,
        seed_days: 45,
        seed_on_empty: false,
        cache_ttl_secs: 300,
        theme: Theme::Light,
        cors_origins: vec![],
    }
}

fn feed_config(url: String) -> LiveFeedConfig {
    LiveFeedConfig {
        url,
        token: Some("test-token".to_string()),
        view_id: "12345".to_string(),
        timeout_secs: 2,
        lookback_days: 30,
    }
}

fn local_row() -> MetricRecord {
    MetricRecord {
        date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
        channel: "Email".to_string(),
        campaign: "Newsletter_Weekly".to_string(),
        sessions: 700,
        conversions: 14.0,
        bounce_rate: 45.0,
        engagement_or_ctr: 0.0,
        cost: 0.0,
    }
}

/// Serve `response` with `status` on a random local port and return its URL.
async fn spawn_stub(status: StatusCode, response: Value) -> String {
    let app = Router::new().route(
        "/reports/batch",
        post(move || {
            let response = response.clone();
            async move { (status, Json(response)) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{addr}/reports/batch")
}

async fn setup(live_feed: Option<LiveFeedConfig>) -> axum::Router {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let state = Arc::new(AppState::new(db, test_config(live_feed)));
    state
        .store_imported(&[local_row()], true)
        .await
        .expect("insert fixture");
    build_app(state)
}

async fn dashboard(app: &axum::Router, uri: &str) -> Value {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let response = app.clone().oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

fn report_rows() -> Value {
    json!({
        "reports": [{
            "columnHeader": {
                "dimensions": ["ga:date", "ga:source", "ga:campaign"],
                "metricHeader": { "metricHeaderEntries": [
                    { "name": "ga:sessions" },
                    { "name": "ga:transactions" },
                    { "name": "ga:bounceRate" },
                    { "name": "ga:percentNewSessions" }
                ]}
            },
            "data": { "rows": [
                { "dimensions": ["20240105", "google", "(not set)"],
                  "metrics": [{ "values": ["1500", "30", "41.2", "63.0"] }] },
                { "dimensions": ["20240106", "newsletter", "spring"],
                  "metrics": [{ "values": ["400", "8", "55.5", "20.0"] }] }
            ]}
        }]
    })
}

// ============================================================
// BDD: Live source serves rows from the reporting API
// ============================================================
#[tokio::test]
async fn test_live_source_serves_api_rows() {
    let url = spawn_stub(StatusCode::OK, report_rows()).await;
    let app = setup(Some(feed_config(url))).await;

    let json = dashboard(&app, "/api/dashboard?source=live").await;
    let data = &json["data"];
    assert_eq!(data["source"]["served_from"], "live");
    assert_eq!(data["status"]["kind"], "success");
    assert_eq!(data["status"]["message"], "Connected to live analytics API");
    assert_eq!(data["kpis"]["total_sessions"], 1900);
    assert_eq!(
        data["filters"]["available"]["channels"],
        json!(["google", "newsletter"])
    );
}

// ============================================================
// BDD: API failure falls back to DuckDB with an error banner
// ============================================================
#[tokio::test]
async fn test_live_source_falls_back_on_api_error() {
    let url = spawn_stub(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "quota exceeded" }),
    )
    .await;
    let app = setup(Some(feed_config(url))).await;

    let json = dashboard(&app, "/api/dashboard?source=live").await;
    let data = &json["data"];
    assert_eq!(data["source"]["requested"], "live");
    assert_eq!(data["source"]["served_from"], "local");
    assert_eq!(data["status"]["kind"], "error");
    let message = data["status"]["message"].as_str().expect("message");
    assert!(message.starts_with("API error: "), "got: {message}");
    assert!(message.ends_with(" | Switched to local database fallback"));
    assert_eq!(data["kpis"]["total_sessions"], 700);
}

// ============================================================
// BDD: Empty API answer also falls back
// ============================================================
#[tokio::test]
async fn test_live_source_falls_back_on_empty_report() {
    let url = spawn_stub(StatusCode::OK, json!({ "reports": [] })).await;
    let app = setup(Some(feed_config(url))).await;

    let json = dashboard(&app, "/api/dashboard?source=live").await;
    assert_eq!(json["data"]["source"]["served_from"], "local");
    assert_eq!(json["data"]["kpis"]["total_sessions"], 700);
}

// ============================================================
// BDD: Requesting live without a configured feed falls back
// ============================================================
#[tokio::test]
async fn test_live_source_without_config_warns() {
    let app = setup(None).await;

    let json = dashboard(&app, "/api/dashboard?source=live").await;
    assert_eq!(json["data"]["source"]["served_from"], "local");
    assert_eq!(json["data"]["status"]["kind"], "warning");
    assert_eq!(json["data"]["kpis"]["total_sessions"], 700);
}

// ============================================================
// BDD: Local source never calls the API
// ============================================================
#[tokio::test]
async fn test_local_source_ignores_live_feed() {
    let url = spawn_stub(StatusCode::OK, report_rows()).await;
    let app = setup(Some(feed_config(url))).await;

    let json = dashboard(&app, "/api/dashboard").await;
    assert_eq!(json["data"]["source"]["served_from"], "local");
    assert_eq!(json["data"]["status"]["message"], "Using local database (DuckDB)");
}
