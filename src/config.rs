use serde::Deserialize;
use std::collections::HashMap;

use crate::catalog::CatalogConfig;
use crate::models::Category;
use crate::sensor_types;

/// Upper bound for `state.flush_rate`; the writer channel holds twice this many writes.
pub const MAX_FLUSH_RATE: u64 = 100_000;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub state: StateConfig,
    pub publishing: PublishingConfig,
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub catalog: CatalogSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// JSON document keyed by connection uuid, re-read on every poll.
    pub path: String,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    pub path: String,
    pub flush_rate: u64,
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
}

fn default_flush_interval_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Max number of entity updates kept in the broadcast channel for /ws/sensors (slow clients may lag).
    pub broadcast_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (ws clients, entities, states saved) at INFO level.
    pub stats_log_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSection {
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,
    /// Field key -> hour of day (0-23); overrides the built-in daily update hour.
    #[serde(default)]
    pub daily_update_hours: HashMap<String, u32>,
}

fn default_categories() -> Vec<Category> {
    Category::ALL.to_vec()
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            daily_update_hours: HashMap::new(),
        }
    }
}

impl CatalogSection {
    pub fn to_catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            categories: self.categories.clone(),
            daily_update_hours: self.daily_update_hours.clone(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.source.path.is_empty(), "source.path must be non-empty");
        anyhow::ensure!(
            self.source.poll_interval_secs > 0,
            "source.poll_interval_secs must be > 0, got {}",
            self.source.poll_interval_secs
        );
        anyhow::ensure!(!self.state.path.is_empty(), "state.path must be non-empty");
        anyhow::ensure!(
            self.state.flush_rate > 0,
            "state.flush_rate must be > 0, got {}",
            self.state.flush_rate
        );
        anyhow::ensure!(
            self.state.flush_rate <= MAX_FLUSH_RATE,
            "state.flush_rate must be <= {MAX_FLUSH_RATE}, got {}",
            self.state.flush_rate
        );
        anyhow::ensure!(
            self.state.flush_interval_secs > 0,
            "state.flush_interval_secs must be > 0, got {}",
            self.state.flush_interval_secs
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            !self.catalog.categories.is_empty(),
            "catalog.categories must list at least one category"
        );
        for (key, hour) in &self.catalog.daily_update_hours {
            anyhow::ensure!(
                sensor_types::is_known_key(key),
                "catalog.daily_update_hours: unknown sensor key {:?}",
                key
            );
            anyhow::ensure!(
                *hour <= 23,
                "catalog.daily_update_hours.{} must be between 0 and 23, got {}",
                key,
                hour
            );
        }
        Ok(())
    }
}
