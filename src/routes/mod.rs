// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::models::EntityView;
use crate::worker::SharedViews;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) updates_tx: broadcast::Sender<EntityView>,
    pub(crate) views: SharedViews,
    pub(crate) ws_sensor_connections: Arc<AtomicUsize>,
}

pub fn app(
    updates_tx: broadcast::Sender<EntityView>,
    views: SharedViews,
    ws_sensor_connections: Arc<AtomicUsize>,
) -> Router {
    let state = AppState {
        updates_tx,
        views,
        ws_sensor_connections,
    };
    Router::new()
        .route("/", get(|| async { "Zonneplan sensor engine" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/sensors", get(http::sensors_handler)) // GET /api/sensors
        .route("/api/sensors/{unique_id}", get(http::sensor_handler)) // GET /api/sensors/{unique_id}
        .route("/ws/sensors", get(ws::ws_sensors)) // WS /ws/sensors
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
