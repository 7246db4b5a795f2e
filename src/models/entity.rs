// Presentation-facing entity models

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{Category, InstallIndex, SensorValue};

/// Device grouping for presentation (identifiers, manufacturer, metadata).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub group_id: String,
    pub manufacturer: String,
    pub name: Option<String>,
    pub model: Option<String>,
    pub sw_version: Option<String>,
}

/// Published state of one entity as exposed over HTTP / WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityView {
    pub unique_id: String,
    pub connection_id: String,
    pub category: Category,
    pub install_index: InstallIndex,
    pub key: String,
    pub name: String,
    pub value: Option<SensorValue>,
    pub unit: Option<String>,
    pub last_reset: Option<DateTime<FixedOffset>>,
    /// Label -> raw snapshot value (`null` when absent).
    pub attributes: BTreeMap<String, serde_json::Value>,
    pub device: DeviceInfo,
    pub published_at: DateTime<Utc>,
}
