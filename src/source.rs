// Snapshot producer: polls a source and publishes each result as an atomic,
// immutable replacement on a watch channel. Subscribers wait on `changed()`.

use chrono::Utc;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::time::{Duration, interval};

use crate::snapshot::ConnectionSnapshots;

/// Where fresh connection snapshots come from.
pub trait SnapshotSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = anyhow::Result<ConnectionSnapshots>> + Send;
}

/// Reads a `{ "<connection uuid>": { ... } }` JSON document on every poll.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for FileSnapshotSource {
    async fn fetch(&self) -> anyhow::Result<ConnectionSnapshots> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let document: serde_json::Value = serde_json::from_str(&text)?;
        ConnectionSnapshots::from_document(document, Utc::now())
    }
}

pub type SnapshotReceiver = watch::Receiver<Arc<ConnectionSnapshots>>;

/// Watch channel seeded with an empty snapshot (never delivered as a change).
pub fn snapshot_channel() -> (watch::Sender<Arc<ConnectionSnapshots>>, SnapshotReceiver) {
    watch::channel(Arc::new(ConnectionSnapshots::default()))
}

/// Spawns the poll loop. A failed fetch publishes nothing; the previous
/// snapshot stays current until the next successful poll.
pub fn spawn_poller<S>(
    source: S,
    poll_interval_secs: u64,
    tx: watch::Sender<Arc<ConnectionSnapshots>>,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()>
where
    S: SnapshotSource + 'static,
{
    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(poll_interval_secs));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match source.fetch().await {
                        Ok(snapshots) => {
                            tracing::debug!(
                                operation = "fetch_snapshot",
                                connections = snapshots.len(),
                                "Snapshot fetched"
                            );
                            if tx.send(Arc::new(snapshots)).is_err() {
                                tracing::debug!("No snapshot subscribers left");
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                operation = "fetch_snapshot",
                                "snapshot fetch failed"
                            );
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Poller shutting down");
                    break;
                }
            }
        }
    })
}
