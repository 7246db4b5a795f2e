// Per-installation device identity and metadata.
//
// One lookup for every category, driven by the `CategorySpec` table: the
// categories only differ in which fields carry the name, model and version.

use serde_json::Value;
use std::fmt;

use crate::models::{Category, DeviceInfo, InstallIndex};
use crate::path;
use crate::snapshot::{display_text, is_truthy};

pub const MANUFACTURER: &str = "Zonneplan";

const UNKNOWN_VERSION: &str = "unknown";

/// How an aggregate device gets its display name.
#[derive(Debug, Clone, Copy)]
pub enum AggregateName {
    Fixed(&'static str),
    /// Field of installation 0.
    FirstInstallation(&'static str),
}

/// How a per-installation device gets its software version string.
#[derive(Debug, Clone, Copy)]
pub enum VersionSource {
    None,
    Field(&'static str),
    /// Fields joined by " - ", each defaulting to "unknown".
    Joined(&'static [&'static str]),
}

/// Identity field names of one category, relative to `<root>.<index>`.
#[derive(Debug, Clone, Copy)]
pub struct CategorySpec {
    pub category: Category,
    pub uuid_field: &'static str,
    pub aggregate_name: AggregateName,
    pub name_field: Option<&'static str>,
    pub model_field: Option<&'static str>,
    pub version: VersionSource,
}

pub const CATEGORY_SPECS: [CategorySpec; 4] = [
    CategorySpec {
        category: Category::Summary,
        uuid_field: "uuid",
        aggregate_name: AggregateName::Fixed("Usage"),
        name_field: None,
        model_field: None,
        version: VersionSource::None,
    },
    CategorySpec {
        category: Category::Photovoltaic,
        uuid_field: "uuid",
        aggregate_name: AggregateName::FirstInstallation("label"),
        name_field: Some("meta.name"),
        model_field: Some("meta.name"),
        version: VersionSource::Joined(&[
            "meta.module_firmware_version",
            "meta.inverter_firmware_version",
        ]),
    },
    CategorySpec {
        category: Category::GridMeter,
        uuid_field: "uuid",
        aggregate_name: AggregateName::FirstInstallation("label"),
        name_field: Some("label"),
        model_field: Some("meta.sgn_serial_number"),
        version: VersionSource::Field("meta.sgn_firmware"),
    },
    CategorySpec {
        category: Category::ChargePoint,
        uuid_field: "uuid",
        aggregate_name: AggregateName::FirstInstallation("label"),
        name_field: Some("label"),
        model_field: Some("meta.serial_number"),
        version: VersionSource::None,
    },
];

pub fn category_spec(category: Category) -> &'static CategorySpec {
    match category {
        Category::Summary => &CATEGORY_SPECS[0],
        Category::Photovoltaic => &CATEGORY_SPECS[1],
        Category::GridMeter => &CATEGORY_SPECS[2],
        Category::ChargePoint => &CATEGORY_SPECS[3],
    }
}

/// Device grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupId {
    /// Shared by every aggregate entity of a category under one connection.
    Category {
        connection_id: String,
        category: Category,
    },
    /// One physical installation.
    Installation {
        connection_id: String,
        stable_id: String,
    },
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupId::Category {
                connection_id,
                category,
            } => write!(f, "{connection_id}_{category}"),
            GroupId::Installation {
                connection_id,
                stable_id,
            } => write!(f, "{connection_id}_{stable_id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub stable_id: String,
    pub group_id: GroupId,
    pub name: Option<String>,
    pub model: Option<String>,
    pub sw_version: Option<String>,
}

impl DeviceIdentity {
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            group_id: self.group_id.to_string(),
            manufacturer: MANUFACTURER.to_string(),
            name: self.name.clone(),
            model: self.model.clone(),
            sw_version: self.sw_version.clone(),
        }
    }
}

/// Resolve identity and device metadata of one installation (or aggregate).
pub fn identity(
    connection_id: &str,
    data: &Value,
    category: Category,
    index: InstallIndex,
) -> DeviceIdentity {
    let spec = category_spec(category);
    match index {
        InstallIndex::Aggregate => {
            let name = match spec.aggregate_name {
                AggregateName::Fixed(name) => Some(name.to_string()),
                AggregateName::FirstInstallation(field) => {
                    installation_field(data, category, 0, field).and_then(display_text)
                }
            };
            DeviceIdentity {
                stable_id: connection_id.to_string(),
                group_id: GroupId::Category {
                    connection_id: connection_id.to_string(),
                    category,
                },
                name,
                model: None,
                sw_version: None,
            }
        }
        InstallIndex::At(n) => {
            let stable_id = installation_stable_id(connection_id, data, spec, n);
            let text = |field: Option<&str>| {
                field
                    .and_then(|f| installation_field(data, category, n, f))
                    .and_then(display_text)
            };
            DeviceIdentity {
                group_id: GroupId::Installation {
                    connection_id: connection_id.to_string(),
                    stable_id: stable_id.clone(),
                },
                stable_id,
                name: text(spec.name_field),
                model: text(spec.model_field),
                sw_version: version_string(data, category, n, spec.version),
            }
        }
    }
}

/// Stable id alone; used for unique ids at catalog-build time.
pub fn stable_id(
    connection_id: &str,
    data: &Value,
    category: Category,
    index: InstallIndex,
) -> String {
    match index {
        InstallIndex::Aggregate => connection_id.to_string(),
        InstallIndex::At(n) => installation_stable_id(connection_id, data, category_spec(category), n),
    }
}

fn installation_stable_id(
    connection_id: &str,
    data: &Value,
    spec: &CategorySpec,
    index: usize,
) -> String {
    match installation_field(data, spec.category, index, spec.uuid_field)
        .filter(|v| is_truthy(v))
        .and_then(display_text)
    {
        Some(uuid) => uuid,
        None => {
            let fallback = format!("{connection_id}_{}_{index}", spec.category.root());
            tracing::warn!(
                connection_id,
                category = %spec.category,
                index,
                fallback = %fallback,
                "installation has no uuid; using positional id"
            );
            fallback
        }
    }
}

fn installation_field<'a>(
    data: &'a Value,
    category: Category,
    index: usize,
    field: &str,
) -> Option<&'a Value> {
    let installation = data.get(category.root())?.get(index)?;
    path::lookup(installation, field)
}

fn version_string(
    data: &Value,
    category: Category,
    index: usize,
    source: VersionSource,
) -> Option<String> {
    match source {
        VersionSource::None => None,
        VersionSource::Field(field) => {
            installation_field(data, category, index, field).and_then(display_text)
        }
        VersionSource::Joined(fields) => Some(
            fields
                .iter()
                .map(|field| {
                    installation_field(data, category, index, field)
                        .filter(|v| is_truthy(v))
                        .and_then(display_text)
                        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
                })
                .collect::<Vec<_>>()
                .join(" - "),
        ),
    }
}
