// Per-connection entity state and the per-snapshot update cycle:
// resolve -> transform -> gate -> publish.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::catalog::{self, CatalogConfig, EntityInstance};
use crate::identity;
use crate::models::{EntityView, PublishedState, Reading, SensorValue};
use crate::path;
use crate::pipeline;
use crate::snapshot::ConnectionSnapshots;
use crate::update_gate;

/// Outcome of evaluating one entity against a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Publish(Option<SensorValue>),
    /// Value missing and the field keeps its previous one.
    KeepPrevious,
    /// Held back by the daily update hour.
    Throttled,
}

/// An entity plus the last state this core published for it.
#[derive(Debug, Clone)]
pub struct SensorEntity {
    pub instance: EntityInstance,
    prior: Option<PublishedState>,
}

impl SensorEntity {
    pub fn new(instance: EntityInstance, prior: Option<PublishedState>) -> Self {
        Self { instance, prior }
    }

    pub fn prior(&self) -> Option<&PublishedState> {
        self.prior.as_ref()
    }

    /// Current value per the pipeline; no state is touched.
    pub fn reading(&self, data: &Value) -> Reading {
        let field = &self.instance.field;
        let raw = path::resolve(data, &field.path, self.instance.index);
        let reading = pipeline::transform(raw, &field.descriptor);
        tracing::debug!(
            name = %self.instance.name,
            path = ?field.path.render(self.instance.index),
            raw = ?raw,
            reading = ?reading,
            "Value"
        );
        reading
    }

    /// Decide whether this snapshot publishes. Pure apart from logging.
    pub fn evaluate<Tz: TimeZone>(&self, data: &Value, now: &DateTime<Tz>) -> Evaluation {
        let Some(value) = self.reading(data).into_published() else {
            return Evaluation::KeepPrevious;
        };
        let daily_update_hour = self.instance.descriptor().daily_update_hour;
        let prior_published_at = self.prior.as_ref().map(|p| p.published_at);
        if update_gate::should_suppress(daily_update_hour, prior_published_at, now) {
            tracing::info!(
                name = %self.instance.name,
                daily_update_hour = ?daily_update_hour,
                "Skip update until daily update hour"
            );
            return Evaluation::Throttled;
        }
        Evaluation::Publish(value)
    }

    /// Record a publish; the only place prior state changes.
    pub fn commit(&mut self, value: Option<SensorValue>, published_at: DateTime<Utc>) {
        tracing::debug!(name = %self.instance.name, value = ?value, "Update");
        self.prior = Some(PublishedState {
            value,
            published_at,
        });
    }

    /// Presentation view; `None` until something was published.
    pub fn view(&self, connection_id: &str, data: &Value) -> Option<EntityView> {
        let prior = self.prior.as_ref()?;
        let instance = &self.instance;
        let field = &instance.field;
        let identity = identity::identity(connection_id, data, instance.category, instance.index);
        Some(EntityView {
            unique_id: instance.unique_id.clone(),
            connection_id: connection_id.to_string(),
            category: instance.category,
            install_index: instance.index,
            key: instance.key().to_string(),
            name: instance.name.clone(),
            value: prior.value.clone(),
            unit: field.descriptor.unit.map(str::to_string),
            last_reset: field
                .last_reset_path
                .as_ref()
                .and_then(|t| pipeline::last_reset(path::resolve(data, t, instance.index))),
            attributes: field
                .attributes
                .iter()
                .map(|(label, template)| {
                    let value = path::resolve(data, template, instance.index)
                        .cloned()
                        .unwrap_or(Value::Null);
                    ((*label).to_string(), value)
                })
                .collect(),
            device: identity.device_info(),
            published_at: prior.published_at,
        })
    }
}

/// All entities of one connection.
#[derive(Debug, Clone)]
pub struct SensorHub {
    connection_id: String,
    entities: Vec<SensorEntity>,
}

impl SensorHub {
    /// Build the catalog for `connection_id`, seeding prior state from `restored`.
    /// Seeded entries are taken out of `restored`.
    pub fn build(
        connection_id: &str,
        data: &Value,
        config: &CatalogConfig,
        restored: &mut HashMap<String, PublishedState>,
    ) -> Self {
        let entities = catalog::build(connection_id, data, config)
            .into_iter()
            .map(|instance| {
                let prior = restored.remove(&instance.unique_id);
                SensorEntity::new(instance, prior)
            })
            .collect();
        Self {
            connection_id: connection_id.to_string(),
            entities,
        }
    }

    pub fn entities(&self) -> &[SensorEntity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn unique_ids(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.instance.unique_id.as_str())
    }

    /// Run one update cycle; returns the views of entities that published.
    pub fn apply_snapshot<Tz: TimeZone>(
        &mut self,
        data: &Value,
        now: &DateTime<Tz>,
    ) -> Vec<EntityView> {
        let published_at = now.with_timezone(&Utc);
        let mut published = Vec::new();
        for entity in &mut self.entities {
            if let Evaluation::Publish(value) = entity.evaluate(data, now) {
                entity.commit(value, published_at);
                if let Some(view) = entity.view(&self.connection_id, data) {
                    published.push(view);
                }
            }
        }
        published
    }

    /// Views of every entity that has published at least once.
    pub fn views(&self, data: &Value) -> Vec<EntityView> {
        self.entities
            .iter()
            .filter_map(|e| e.view(&self.connection_id, data))
            .collect()
    }
}

/// Result of applying one `ConnectionSnapshots` to the registry.
#[derive(Debug, Default)]
pub struct Applied {
    pub published: Vec<EntityView>,
    pub added_connections: Vec<String>,
    /// Unique ids of entities destroyed with their connection.
    pub removed: Vec<String>,
}

/// Hubs for every known connection. Connections are set up the first time
/// they appear and torn down when they disappear from a snapshot.
#[derive(Debug)]
pub struct SensorRegistry {
    catalog: CatalogConfig,
    restored: HashMap<String, PublishedState>,
    hubs: BTreeMap<String, SensorHub>,
}

impl SensorRegistry {
    pub fn new(catalog: CatalogConfig, restored: HashMap<String, PublishedState>) -> Self {
        Self {
            catalog,
            restored,
            hubs: BTreeMap::new(),
        }
    }

    pub fn hub(&self, connection_id: &str) -> Option<&SensorHub> {
        self.hubs.get(connection_id)
    }

    pub fn entity_count(&self) -> usize {
        self.hubs.values().map(SensorHub::len).sum()
    }

    pub fn apply<Tz: TimeZone>(
        &mut self,
        snapshots: &ConnectionSnapshots,
        now: &DateTime<Tz>,
    ) -> Applied {
        let mut applied = Applied::default();

        let gone: Vec<String> = self
            .hubs
            .keys()
            .filter(|id| snapshots.connection(id).is_none())
            .cloned()
            .collect();
        for connection_id in gone {
            if let Some(hub) = self.hubs.remove(&connection_id) {
                tracing::info!(connection_id = %connection_id, entities = hub.len(), "connection removed");
                applied.removed.extend(hub.unique_ids().map(str::to_string));
            }
        }

        for connection_id in snapshots.connection_ids() {
            let Some(data) = snapshots.connection(connection_id) else {
                continue;
            };
            let hub = match self.hubs.entry(connection_id.to_string()) {
                std::collections::btree_map::Entry::Occupied(entry) => entry.into_mut(),
                std::collections::btree_map::Entry::Vacant(entry) => {
                    let hub =
                        SensorHub::build(connection_id, data, &self.catalog, &mut self.restored);
                    tracing::info!(
                        connection_id,
                        entities = hub.len(),
                        categories = ?snapshots.categories_present(connection_id),
                        "connection set up"
                    );
                    applied.added_connections.push(connection_id.to_string());
                    entry.insert(hub)
                }
            };
            applied.published.extend(hub.apply_snapshot(data, now));
        }
        applied
    }
}
