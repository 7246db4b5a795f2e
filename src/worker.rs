// Sensor worker: applies every fresh snapshot to the registry and publishes.
// Persistence runs in a dedicated state writer task (channel), batched.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{RwLock, broadcast, mpsc, oneshot};
use tokio::time::{Duration, Instant, interval};
use tracing::Instrument;

use crate::catalog::CatalogConfig;
use crate::hub::SensorRegistry;
use crate::models::{EntityView, PublishedState};
use crate::source::SnapshotReceiver;
use crate::state_repo::{StateRepo, StoredState};

/// Rate limit for "no receivers" debug log.
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Latest published view per unique id, read by HTTP handlers.
pub type SharedViews = Arc<RwLock<BTreeMap<String, EntityView>>>;

/// Channel capacity for the state writer (backpressure if writer falls behind).
pub fn writer_channel_capacity(flush_rate: u64) -> usize {
    usize::try_from(flush_rate)
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .max(32)
}

/// Work for the state writer. Saves and deletes share one channel so a delete
/// is ordered after every save queued before it.
#[derive(Debug, Clone)]
pub enum StateWrite {
    Save(StoredState),
    Delete(Vec<String>),
}

/// Channels, repo and shutdown for the worker.
pub struct WorkerDeps {
    pub snapshots_rx: SnapshotReceiver,
    pub restored: HashMap<String, PublishedState>,
    pub tx: broadcast::Sender<EntityView>,
    pub write_tx: mpsc::Sender<StateWrite>,
    pub views: SharedViews,
    pub ws_sensor_connections: Arc<AtomicUsize>,
    pub states_saved_total: Arc<AtomicU64>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

pub struct WorkerConfig {
    pub catalog: CatalogConfig,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

/// Batching for the state writer task.
pub struct StateWriterConfig {
    pub flush_rate: u64,
    pub flush_interval_secs: u64,
}

/// Spawns the task that receives published states and flushes them to the DB.
/// Flushes when buffer len >= flush_rate, every flush_interval_secs, and when
/// the channel closes. A delete drops buffered states of those ids first.
pub fn spawn_state_writer(
    mut write_rx: mpsc::Receiver<StateWrite>,
    state_repo: Arc<StateRepo>,
    config: StateWriterConfig,
    states_saved_total: Arc<AtomicU64>,
) -> tokio::task::JoinHandle<()> {
    let flush_interval = Duration::from_secs(config.flush_interval_secs);
    tokio::spawn(async move {
        let mut buffer: Vec<StoredState> = Vec::new();
        let mut flush_tick = interval(flush_interval);
        flush_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                result = write_rx.recv() => {
                    match result {
                        Some(StateWrite::Save(state)) => {
                            buffer.push(state);
                            if buffer.len() as u64 >= config.flush_rate
                                && let Err(e) = flush_buffer(&state_repo, &mut buffer, &states_saved_total).await
                            {
                                tracing::warn!(error = %e, "state writer: save_states failed");
                            }
                        }
                        Some(StateWrite::Delete(ids)) => {
                            let gone: HashSet<&str> = ids.iter().map(String::as_str).collect();
                            buffer.retain(|s| !gone.contains(s.unique_id.as_str()));
                            if let Err(e) = state_repo.delete(&ids).await {
                                tracing::warn!(
                                    error = %e,
                                    operation = "delete_states",
                                    "Failed to delete states of removed connection"
                                );
                            }
                        }
                        None => break,
                    }
                }
                _ = flush_tick.tick() => {
                    if let Err(e) = flush_buffer(&state_repo, &mut buffer, &states_saved_total).await {
                        tracing::warn!(error = %e, "state writer: save_states failed");
                    }
                }
            }
        }
        if let Err(e) = flush_buffer(&state_repo, &mut buffer, &states_saved_total).await {
            tracing::warn!(error = %e, "state writer: final flush failed");
        }
        tracing::debug!("State writer shutting down");
    })
}

async fn flush_buffer(
    state_repo: &StateRepo,
    buffer: &mut Vec<StoredState>,
    states_saved_total: &AtomicU64,
) -> anyhow::Result<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    let n = buffer.len();
    state_repo.save_states(buffer).await?;
    states_saved_total.fetch_add(n as u64, Ordering::Relaxed);
    buffer.clear();
    tracing::debug!(operation = "save_states", states_count = n, "States saved");
    Ok(())
}

pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        mut snapshots_rx,
        restored,
        tx,
        write_tx,
        views,
        ws_sensor_connections,
        states_saved_total,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        catalog,
        stats_log_interval_secs,
    } = config;

    let worker = async move {
        let mut registry = SensorRegistry::new(catalog, restored);
        let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut snapshots_applied_total: u64 = 0;
        let mut last_no_receivers_warn: Option<Instant> = None;

        loop {
            tokio::select! {
                changed = snapshots_rx.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Snapshot producer gone");
                        break;
                    }
                    let snapshots = snapshots_rx.borrow_and_update().clone();
                    let applied = registry.apply(&snapshots, &chrono::Local::now());
                    snapshots_applied_total += 1;
                    tracing::debug!(
                        fetched_at = %snapshots.fetched_at,
                        published = applied.published.len(),
                        removed = applied.removed.len(),
                        "snapshot applied"
                    );

                    if !applied.removed.is_empty() {
                        {
                            let mut guard = views.write().await;
                            for id in &applied.removed {
                                guard.remove(id);
                            }
                        }
                        if write_tx.send(StateWrite::Delete(applied.removed)).await.is_err() {
                            tracing::debug!("State writer channel closed");
                        }
                    }

                    if applied.published.is_empty() {
                        continue;
                    }
                    {
                        let mut guard = views.write().await;
                        for view in &applied.published {
                            guard.insert(view.unique_id.clone(), view.clone());
                        }
                    }
                    for view in applied.published {
                        let stored = StoredState {
                            unique_id: view.unique_id.clone(),
                            state: PublishedState {
                                value: view.value.clone(),
                                published_at: view.published_at,
                            },
                        };
                        if tx.send(view).is_err() {
                            let should_warn = last_no_receivers_warn
                                .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
                            if should_warn {
                                tracing::debug!(
                                    operation = "broadcast_update",
                                    "No active WebSocket clients; broadcast channel has no receivers"
                                );
                                last_no_receivers_warn = Some(Instant::now());
                            }
                        }
                        if write_tx.send(StateWrite::Save(stored)).await.is_err() {
                            tracing::debug!("State writer channel closed");
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        ws_sensor_clients = ws_sensor_connections.load(Ordering::Relaxed),
                        entities = registry.entity_count(),
                        snapshots_applied_total,
                        states_saved_total = states_saved_total.load(Ordering::Relaxed),
                        "app stats"
                    );
                }
            }
        }
    };
    tokio::spawn(worker.instrument(tracing::debug_span!("worker", stats_log_interval_secs)))
}
