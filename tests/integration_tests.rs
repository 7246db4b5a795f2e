// Integration tests: HTTP and WebSocket endpoints

mod common;

use axum_test::TestServer;
use common::{CONNECTION_ID, cest, connection_data};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{RwLock, broadcast};
use zonneplan::catalog::CatalogConfig;
use zonneplan::hub::SensorHub;
use zonneplan::models::EntityView;
use zonneplan::routes;
use zonneplan::worker::SharedViews;

fn published_views() -> Vec<EntityView> {
    let mut hub = SensorHub::build(
        CONNECTION_ID,
        &connection_data(),
        &CatalogConfig::default(),
        &mut HashMap::new(),
    );
    hub.apply_snapshot(&connection_data(), &cest(2024, 6, 1, 10, 0))
}

fn shared(views: &[EntityView]) -> SharedViews {
    Arc::new(RwLock::new(
        views
            .iter()
            .map(|v| (v.unique_id.clone(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
    ))
}

fn test_app(views: SharedViews) -> (axum::Router, broadcast::Sender<EntityView>) {
    let (tx, _) = broadcast::channel(16);
    let app = routes::app(tx.clone(), views, Arc::new(AtomicUsize::new(0)));
    (app, tx)
}

/// Build TestServer with http_transport (required for WebSocket tests).
fn test_server_with_http(views: SharedViews) -> (TestServer, broadcast::Sender<EntityView>) {
    let (app, tx) = test_app(views);
    let server = TestServer::builder().http_transport().build(app).unwrap();
    (server, tx)
}

#[tokio::test]
async fn test_root_endpoint() {
    let (app, _) = test_app(shared(&[]));
    let server = TestServer::new(app).unwrap();
    let response = server.get("/").await;
    response.assert_status_ok();
    response.assert_text("Zonneplan sensor engine");
}

#[tokio::test]
async fn test_version_endpoint() {
    let (app, _) = test_app(shared(&[]));
    let server = TestServer::new(app).unwrap();
    let response = server.get("/version").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json.get("name").and_then(|v| v.as_str()), Some("zonneplan"));
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn test_sensors_endpoint_lists_current_views() {
    let views = published_views();
    let (app, _) = test_app(shared(&views));
    let server = TestServer::new(app).unwrap();
    let response = server.get("/api/sensors").await;
    response.assert_status_ok();
    let json: Vec<serde_json::Value> = response.json();
    assert_eq!(json.len(), views.len());

    let usage = json
        .iter()
        .find(|v| v["uniqueId"] == "conn-1_usage")
        .unwrap();
    assert_eq!(usage["value"], 1200.0);
    assert_eq!(usage["unit"], "W");
    assert_eq!(usage["category"], "summary");
    assert_eq!(usage["installIndex"], -1);
    assert_eq!(usage["device"]["manufacturer"], "Zonneplan");
    assert_eq!(usage["device"]["groupId"], "conn-1_summary_data");
}

#[tokio::test]
async fn test_sensor_endpoint_returns_single_view() {
    let views = published_views();
    let (app, _) = test_app(shared(&views));
    let server = TestServer::new(app).unwrap();

    let response = server.get("/api/sensors/p1-a_electricity_delivery").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["value"], 430.0);
    assert_eq!(json["installIndex"], 0);
    assert_eq!(json["device"]["model"], "SN123");
    assert_eq!(json["device"]["swVersion"], "5.0");
}

#[tokio::test]
async fn test_sensor_endpoint_unknown_id_is_not_found() {
    let (app, _) = test_app(shared(&[]));
    let server = TestServer::new(app).unwrap();
    let response = server.get("/api/sensors/nope").expect_failure().await;
    response.assert_status_not_found();
}

// --- WebSocket message tests (require http_transport + ws feature) ---
// Receive until we get valid JSON of the wanted type (server may send Ping first).

async fn receive_message_of_type(
    ws: &mut axum_test::TestWebSocket,
    wanted: &str,
) -> serde_json::Value {
    let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(3);
    loop {
        let text = ws.receive_text().await;
        if let Ok(v) = serde_json::from_str::<serde_json::Value>(&text)
            && v["type"] == wanted
        {
            return v;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {wanted} message"
        );
    }
}

#[tokio::test]
async fn test_ws_sensors_sends_current_views_first() {
    let views = published_views();
    let (server, _) = test_server_with_http(shared(&views));
    let mut ws = server
        .get_websocket("/ws/sensors")
        .await
        .into_websocket()
        .await;
    let welcome = receive_message_of_type(&mut ws, "snapshot").await;
    assert_eq!(
        welcome["sensors"].as_array().map(Vec::len),
        Some(views.len())
    );
}

#[tokio::test]
async fn test_ws_sensors_receives_broadcast_update() {
    let views = published_views();
    let (server, tx) = test_server_with_http(shared(&[]));
    let mut ws = server
        .get_websocket("/ws/sensors")
        .await
        .into_websocket()
        .await;
    let _ = receive_message_of_type(&mut ws, "snapshot").await;

    let update = views
        .iter()
        .find(|v| v.unique_id == "cp-a_charge_point_state")
        .cloned()
        .unwrap();
    let tx_clone = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        let _ = tx_clone.send(update);
    });
    let received = receive_message_of_type(&mut ws, "update").await;
    assert_eq!(received["sensor"]["uniqueId"], "cp-a_charge_point_state");
    assert_eq!(received["sensor"]["value"], "Charging");
}
