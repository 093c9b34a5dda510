//! Integration tests for the API server
//!
//! Exercises the HTTP surface against stub quotes and a recording sink.

use serde_json::{json, Value};
use stockwatch::config::AppConfig;
use stockwatch::models::Quote;

use crate::test_utils::TestApp;

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let app = TestApp::new();
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert_eq!(body["service"], "stockwatch");
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let app = TestApp::new();
    app.server.get("/health").await;
    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    assert!(body.contains("http_requests_total"));
    assert!(body.contains("alerts_fired_total"));
}

#[tokio::test]
async fn watchlist_lists_defaults_in_order() {
    let app = TestApp::new();
    let body: Value = app.server.get("/api/watchlist").await.json();
    let symbols: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|r| r["symbol"].as_str())
        .collect();
    assert_eq!(symbols, vec!["CSCO", "GSK", "GOOGL"]);
}

#[tokio::test]
async fn watchlist_add_update_delete() {
    let app = TestApp::new();

    let created = app
        .server
        .post("/api/watchlist")
        .json(&json!({"symbol": "aapl", "name": "Apple Inc.", "alert_pct": 1.5}))
        .await;
    assert_eq!(created.status_code(), 201);
    let body: Value = created.json();
    assert_eq!(body["symbol"], "AAPL");
    assert_eq!(body["alert_pct"], 1.5);

    let updated = app
        .server
        .put("/api/watchlist/3")
        .json(&json!({"alert_pct": 3.0}))
        .await;
    assert_eq!(updated.status_code(), 200);
    assert_eq!(updated.json::<Value>()["alert_pct"], 3.0);

    let deleted = app.server.delete("/api/watchlist/0").await;
    assert_eq!(deleted.status_code(), 204);

    let body: Value = app.server.get("/api/watchlist").await.json();
    let symbols: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|r| r["symbol"].as_str())
        .collect();
    assert_eq!(symbols, vec!["GSK", "GOOGL", "AAPL"]);
}

#[tokio::test]
async fn watchlist_rejects_invalid_changes() {
    let app = TestApp::new();

    let duplicate = app
        .server
        .post("/api/watchlist")
        .json(&json!({"symbol": "csco", "name": "Cisco"}))
        .await;
    assert_eq!(duplicate.status_code(), 409);
    assert!(duplicate.json::<Value>()["error"]
        .as_str()
        .unwrap_or_default()
        .contains("CSCO"));

    let bad_threshold = app
        .server
        .post("/api/watchlist")
        .json(&json!({"symbol": "TSLA", "name": "Tesla", "alert_pct": 0.0}))
        .await;
    assert_eq!(bad_threshold.status_code(), 422);

    let missing = app
        .server
        .put("/api/watchlist/42")
        .json(&json!({"alert_pct": 1.0}))
        .await;
    assert_eq!(missing.status_code(), 404);

    assert_eq!(app.server.delete("/api/watchlist/42").await.status_code(), 404);
}

#[tokio::test]
async fn refresh_reports_alerts_and_history() {
    let app = TestApp::new();
    app.stubs
        .source
        .set("CSCO", Quote::new(51.5).with_day_open(50.0))
        .await;
    app.stubs
        .source
        .set("GSK", Quote::new(40.1).with_day_open(40.0))
        .await;

    let response = app.server.post("/api/refresh").await;
    assert_eq!(response.status_code(), 200);
    let report: Value = response.json();

    assert_eq!(report["outcomes"][0]["symbol"], "CSCO");
    assert_eq!(report["outcomes"][0]["result"]["outcome"], "fired");
    assert_eq!(report["outcomes"][1]["result"]["outcome"], "normal");
    assert_eq!(report["outcomes"][2]["result"]["outcome"], "no_data");
    assert!(report["outcomes"][2]["error"].is_string());
    assert_eq!(report["alerts"].as_array().map(|a| a.len()), Some(1));
    assert!(report["message"].as_str().unwrap_or_default().contains("*CSCO*"));
    assert_eq!(app.stubs.sink.count().await, 1);

    let latest: Value = app.server.get("/api/report").await.json();
    assert_eq!(latest["cycle_id"], report["cycle_id"]);

    let history: Value = app.server.get("/api/history/csco").await.json();
    assert_eq!(history["symbol"], "CSCO");
    assert_eq!(history["prices"], json!([51.5]));

    assert_eq!(app.server.get("/api/history/GOOGL").await.status_code(), 404);
}

#[tokio::test]
async fn report_is_not_found_before_first_cycle() {
    let app = TestApp::new();
    assert_eq!(app.server.get("/api/report").await.status_code(), 404);
    assert_eq!(app.server.post("/api/alerts/send").await.status_code(), 404);
}

#[tokio::test]
async fn manual_send_delivers_pending_alerts() {
    let mut config = AppConfig::default();
    config.whatsapp.auto_send = false;
    let app = TestApp::with_config(config);
    app.stubs
        .source
        .set("GSK", Quote::new(37.0).with_day_open(40.0))
        .await;

    app.server.post("/api/refresh").await;
    assert_eq!(app.stubs.sink.count().await, 0);

    let response = app.server.post("/api/alerts/send").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["deliveries"][0]["status"], "sent");
    assert_eq!(app.stubs.sink.count().await, 1);
    assert!(app
        .stubs
        .sink
        .last_message()
        .await
        .unwrap_or_default()
        .contains("⬇️ DOWN 7.50%"));
}

#[tokio::test]
async fn reset_restores_defaults_and_clears_history() {
    let app = TestApp::new();
    app.stubs.source.set("CSCO", Quote::new(50.0)).await;
    app.server.post("/api/refresh").await;
    app.server.delete("/api/watchlist/2").await;

    let response = app.server.post("/api/watchlist/reset").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>().as_array().map(|a| a.len()), Some(3));
    assert_eq!(app.server.get("/api/history/CSCO").await.status_code(), 404);
}

#[tokio::test]
async fn recipients_can_be_managed() {
    let app = TestApp::new();

    let created = app
        .server
        .post("/api/recipients")
        .json(&json!({"name": "Alice", "phone": "+44 7700 900000"}))
        .await;
    assert_eq!(created.status_code(), 201);

    let invalid = app
        .server
        .post("/api/recipients")
        .json(&json!({"name": "", "phone": "+1"}))
        .await;
    assert_eq!(invalid.status_code(), 422);

    let list: Value = app.server.get("/api/recipients").await.json();
    assert_eq!(list[0]["name"], "Alice");

    assert_eq!(app.server.delete("/api/recipients/0").await.status_code(), 204);
    assert_eq!(app.server.delete("/api/recipients/0").await.status_code(), 404);
}

#[tokio::test]
async fn config_export_and_import() {
    let app = TestApp::new();

    let exported: Value = app.server.get("/api/config").await.json();
    assert_eq!(exported["refresh_interval"], 60);
    assert_eq!(exported["whatsapp"]["transport"], "deep_link");

    let imported = app
        .server
        .put("/api/config")
        .json(&json!({
            "stocks": [{"symbol": "VOD.L", "name": "Vodafone", "alert_pct": 1.0}],
            "refresh_interval": 300
        }))
        .await;
    assert_eq!(imported.status_code(), 200);

    let watchlist: Value = app.server.get("/api/watchlist").await.json();
    assert_eq!(watchlist, json!([{"symbol": "VOD.L", "name": "Vodafone", "alert_pct": 1.0}]));

    let rejected = app
        .server
        .put("/api/config")
        .json(&json!({"refresh_interval": 0}))
        .await;
    assert_eq!(rejected.status_code(), 422);

    let uneven = app
        .server
        .put("/api/config")
        .json(&json!({"refresh_interval": 90}))
        .await;
    assert_eq!(uneven.status_code(), 422);
    let current: Value = app.server.get("/api/config").await.json();
    assert_eq!(current["refresh_interval"], 300);
}

#[tokio::test]
async fn search_goes_through_quote_source() {
    let app = TestApp::new();
    app.stubs.source.set("AAPL", Quote::new(1.0)).await;
    app.stubs.source.set("MSFT", Quote::new(1.0)).await;

    let body: Value = app.server.get("/api/search").add_query_param("q", "aap").await.json();
    assert_eq!(body.as_array().map(|a| a.len()), Some(1));
    assert_eq!(body[0]["symbol"], "AAPL");
}

#[tokio::test]
async fn notifier_status_reports_transport() {
    let app = TestApp::new();
    let body: Value = app.server.get("/api/notifier/status").await.json();
    assert_eq!(body["transport"], "deep_link");
    assert_eq!(body["status"]["state"], "ready");

    let qr: Value = app.server.get("/api/notifier/qr").await.json();
    assert_eq!(qr["type"], "not_supported");
}
