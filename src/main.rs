use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize};
use tokio::sync::{RwLock, broadcast, mpsc};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;
use zonneplan::*;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let (tx, _) =
        broadcast::channel::<models::EntityView>(app_config.publishing.broadcast_capacity);

    let state_repo = Arc::new(state_repo::StateRepo::connect(&app_config.state.path).await?);
    state_repo.init().await?;
    let restored = state_repo.load_all().await?;
    tracing::info!(restored = restored.len(), "Restored published states");

    let (snapshots_tx, snapshots_rx) = source::snapshot_channel();
    let (poller_shutdown_tx, poller_shutdown_rx) = tokio::sync::oneshot::channel();
    let poller_handle = source::spawn_poller(
        source::FileSnapshotSource::new(&app_config.source.path),
        app_config.source.poll_interval_secs,
        snapshots_tx,
        poller_shutdown_rx,
    );

    let states_saved_total = Arc::new(AtomicU64::new(0));
    let (write_tx, write_rx) =
        mpsc::channel(worker::writer_channel_capacity(app_config.state.flush_rate));
    let writer_handle = worker::spawn_state_writer(
        write_rx,
        state_repo.clone(),
        worker::StateWriterConfig {
            flush_rate: app_config.state.flush_rate,
            flush_interval_secs: app_config.state.flush_interval_secs,
        },
        states_saved_total.clone(),
    );

    let views: worker::SharedViews = Arc::new(RwLock::new(BTreeMap::new()));
    let ws_sensor_connections = Arc::new(AtomicUsize::new(0));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            snapshots_rx,
            restored,
            tx: tx.clone(),
            write_tx,
            views: views.clone(),
            ws_sensor_connections: ws_sensor_connections.clone(),
            states_saved_total,
            shutdown_rx,
        },
        worker::WorkerConfig {
            catalog: app_config.catalog.to_catalog_config(),
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    let app = routes::app(tx, views, ws_sensor_connections);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
            let _ = poller_shutdown_tx.send(());
            let _ = poller_handle.await;
            let _ = shutdown_tx.send(());
            let _ = worker_handle.await;
            // Worker dropped its write_tx: the writer flushes what is left and exits.
            let _ = writer_handle.await;
        }
    }

    Ok(())
}
