// GET handlers: version, api/sensors

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::AppState;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/sensors: every entity that has published at least once, ordered by unique id.
pub(super) async fn sensors_handler(State(state): State<AppState>) -> impl IntoResponse {
    let views: Vec<_> = state.views.read().await.values().cloned().collect();
    axum::Json(views)
}

pub(super) async fn sensor_handler(
    State(state): State<AppState>,
    Path(unique_id): Path<String>,
) -> impl IntoResponse {
    match state.views.read().await.get(&unique_id) {
        Some(view) => axum::Json(view.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(serde_json::json!({ "error": format!("unknown sensor {}", unique_id) })),
        )
            .into_response(),
    }
}
