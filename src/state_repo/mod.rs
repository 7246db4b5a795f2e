// SQLite store of the last published state per entity, so the daily update
// gate keeps its memory across restarts.

mod blob;

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

use crate::models::PublishedState;

/// One row handed to the state writer.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredState {
    pub unique_id: String,
    pub state: PublishedState,
}

pub struct StateRepo {
    pool: SqlitePool,
}

impl StateRepo {
    pub async fn connect(path: &str) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS published_state (
                unique_id TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                published_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self, states), fields(repo = "state", operation = "save_states", states_count = states.len()))]
    pub async fn save_states(&self, states: &[StoredState]) -> anyhow::Result<()> {
        if states.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for s in states {
            let value = blob::encode_value(s.state.value.as_ref())?;
            sqlx::query(
                "INSERT OR REPLACE INTO published_state (unique_id, value, published_at) VALUES ($1, $2, $3)",
            )
            .bind(&s.unique_id)
            .bind(&value)
            .bind(s.state.published_at.timestamp_millis())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Every stored state keyed by unique id. Rows that fail to decode are skipped.
    #[instrument(skip(self), fields(repo = "state", operation = "load_all"))]
    pub async fn load_all(&self) -> anyhow::Result<HashMap<String, PublishedState>> {
        let rows = sqlx::query("SELECT unique_id, value, published_at FROM published_state")
            .fetch_all(&self.pool)
            .await?;

        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            let unique_id: String = row.try_get("unique_id")?;
            match Self::parse_state_row(&row) {
                Ok(state) => {
                    out.insert(unique_id, state);
                }
                Err(e) => {
                    tracing::warn!(error = %e, unique_id = %unique_id, "skipping unreadable stored state");
                }
            }
        }
        Ok(out)
    }

    #[instrument(skip(self, unique_ids), fields(repo = "state", operation = "delete", count = unique_ids.len()))]
    pub async fn delete(&self, unique_ids: &[String]) -> anyhow::Result<u64> {
        if unique_ids.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;
        for id in unique_ids {
            let r = sqlx::query("DELETE FROM published_state WHERE unique_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            deleted += r.rows_affected();
        }
        tx.commit().await?;
        Ok(deleted)
    }

    pub async fn count(&self) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM published_state")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    fn parse_state_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<PublishedState> {
        let data: Vec<u8> = row.try_get("value")?;
        let published_at_ms: i64 = row.try_get("published_at")?;
        let published_at = DateTime::<Utc>::from_timestamp_millis(published_at_ms)
            .ok_or_else(|| anyhow::anyhow!("published_at out of range: {}", published_at_ms))?;
        Ok(PublishedState {
            value: blob::decode_value(&data)?,
            published_at,
        })
    }
}
