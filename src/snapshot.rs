// Immutable poll results shared by every entity of a cycle.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::Category;
use crate::path;

/// One poll result: connection uuid -> that connection's data document.
/// Replaced wholesale on each poll, never mutated after publication.
#[derive(Debug, Clone, Default)]
pub struct ConnectionSnapshots {
    pub fetched_at: DateTime<Utc>,
    connections: BTreeMap<String, Arc<Value>>,
}

impl ConnectionSnapshots {
    pub fn new(fetched_at: DateTime<Utc>, connections: BTreeMap<String, Value>) -> Self {
        Self {
            fetched_at,
            connections: connections
                .into_iter()
                .map(|(id, data)| (id, Arc::new(data)))
                .collect(),
        }
    }

    /// Build from a `{ "<connection uuid>": { ... } }` document.
    pub fn from_document(document: Value, fetched_at: DateTime<Utc>) -> anyhow::Result<Self> {
        let Value::Object(map) = document else {
            anyhow::bail!("snapshot document must be an object keyed by connection uuid");
        };
        Ok(Self::new(fetched_at, map.into_iter().collect()))
    }

    pub fn connection(&self, connection_id: &str) -> Option<&Arc<Value>> {
        self.connections.get(connection_id)
    }

    pub fn connection_ids(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Value at a concrete dotted path of one connection's data.
    pub fn get_snapshot_value(&self, connection_id: &str, path: &str) -> Option<&Value> {
        path::lookup(self.connection(connection_id)?, path)
    }

    /// Installation count per category present for `connection_id`.
    pub fn categories_present(&self, connection_id: &str) -> BTreeMap<Category, usize> {
        let Some(data) = self.connection(connection_id) else {
            return BTreeMap::new();
        };
        Category::ALL
            .into_iter()
            .map(|category| (category, installation_count(data, category)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}

/// Number of installations of `category` in one connection's data.
/// The summary category counts as one when its mapping is non-empty.
pub fn installation_count(data: &Value, category: Category) -> usize {
    match data.get(category.root()) {
        Some(Value::Array(items)) if category.is_indexed() => items.len(),
        Some(value) if !category.is_indexed() && is_truthy(value) => 1,
        _ => 0,
    }
}

/// Truthiness of upstream data: null, false, zero, "" and empty containers are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Human-readable text for a metadata field; `None` for null.
pub fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
