// WebSocket handler and stream logic

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant, timeout};

use super::AppState;
use crate::models::EntityView;
use crate::worker::SharedViews;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements ws_sensors connection count on drop (connect = +1, drop = -1).
struct WsSensorsGuard(Arc<AtomicUsize>);

impl Drop for WsSensorsGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
    }
}

pub(super) async fn ws_sensors(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let tx = state.updates_tx.clone();
    let conn_count = state.ws_sensor_connections.clone();
    let views = state.views.clone();
    ws.on_upgrade(move |socket| async move {
        // Subscribe before reading the current views so no update falls in between.
        let mut rx = tx.subscribe();
        if let Err(e) = stream_sensors(socket, &mut rx, conn_count, views).await {
            tracing::info!("Sensors stream error: {}", e);
        }
    })
}

async fn send_text(socket: &mut WebSocket, json: String) -> bool {
    let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
    matches!(r, Ok(Ok(())))
}

async fn stream_sensors(
    mut socket: WebSocket,
    rx: &mut broadcast::Receiver<EntityView>,
    conn_count: Arc<AtomicUsize>,
    views: SharedViews,
) -> anyhow::Result<()> {
    conn_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let _guard = WsSensorsGuard(conn_count);
    tracing::info!("Client connected to sensors stream");

    let current: Vec<EntityView> = views.read().await.values().cloned().collect();
    let welcome = serde_json::json!({ "type": "snapshot", "sensors": current });
    if !send_text(&mut socket, serde_json::to_string(&welcome)?).await {
        return Ok(());
    }

    let mut ping_interval =
        tokio::time::interval_at(Instant::now() + WS_PING_INTERVAL, WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(view) => {
                        let update = serde_json::json!({ "type": "update", "sensor": view });
                        if !send_text(&mut socket, serde_json::to_string(&update)?).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/sensors client lagged, skipped {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if !matches!(r, Ok(Ok(()))) {
                    break;
                }
            }
        }
    }
    Ok(())
}
