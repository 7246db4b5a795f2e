// Entity discovery: which (category, install index, field) tuples exist for a
// connection. Built once per connection from the snapshot at setup time.

use serde_json::Value;
use std::collections::HashMap;

use crate::identity;
use crate::models::{Category, FieldDescriptor, InstallIndex};
use crate::path::{PathTemplate, TemplateError};
use crate::sensor_types;
use crate::snapshot::installation_count;

/// Which categories to expose and per-field daily update hour overrides.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub categories: Vec<Category>,
    pub daily_update_hours: HashMap<String, u32>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            categories: Category::ALL.to_vec(),
            daily_update_hours: HashMap::new(),
        }
    }
}

impl CatalogConfig {
    pub fn is_enabled(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    fn effective(&self, descriptor: &FieldDescriptor) -> FieldDescriptor {
        let mut descriptor = *descriptor;
        if let Some(hour) = self.daily_update_hours.get(descriptor.key) {
            descriptor.daily_update_hour = Some(*hour);
        }
        descriptor
    }
}

/// A descriptor with its templates parsed.
#[derive(Debug, Clone)]
pub struct BoundField {
    pub descriptor: FieldDescriptor,
    pub path: PathTemplate,
    pub last_reset_path: Option<PathTemplate>,
    pub attributes: Vec<(&'static str, PathTemplate)>,
}

impl BoundField {
    /// Parse every template of `descriptor`. Non-indexed fields reject the placeholder.
    pub fn bind(descriptor: FieldDescriptor, indexed: bool) -> Result<Self, TemplateError> {
        let parse = |template: &str| {
            if indexed {
                PathTemplate::parse(template)
            } else {
                PathTemplate::parse_fixed(template)
            }
        };
        Ok(Self {
            path: parse(descriptor.path)?,
            last_reset_path: descriptor.last_reset_path.map(parse).transpose()?,
            attributes: descriptor
                .attributes
                .iter()
                .map(|a| parse(a.path).map(|t| (a.label, t)))
                .collect::<Result<_, _>>()?,
            descriptor,
        })
    }
}

/// One entity discovered for a connection.
#[derive(Debug, Clone)]
pub struct EntityInstance {
    pub connection_id: String,
    pub category: Category,
    pub index: InstallIndex,
    pub field: BoundField,
    /// `<stable id>_<field key>`, fixed at catalog-build time.
    pub unique_id: String,
    pub name: String,
}

impl EntityInstance {
    pub fn key(&self) -> &'static str {
        self.field.descriptor.key
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.field.descriptor
    }
}

/// Display name; installations after the first get a 1-based ordinal suffix.
pub fn display_name(base: &str, index: InstallIndex) -> String {
    match index {
        InstallIndex::At(n) if n > 0 => format!("{base} ({})", n + 1),
        _ => base.to_string(),
    }
}

/// Enumerate every entity of `connection_id` from its data at setup time.
/// A category absent from the data contributes nothing.
pub fn build(connection_id: &str, data: &Value, config: &CatalogConfig) -> Vec<EntityInstance> {
    let mut entities = Vec::new();
    for category in Category::ALL {
        if !config.is_enabled(category) {
            continue;
        }
        let count = installation_count(data, category);
        if count == 0 {
            tracing::debug!(connection_id, category = %category, "category not present");
            continue;
        }
        tracing::debug!(connection_id, category = %category, installations = count, "setup sensors");

        if category.is_indexed() {
            for n in 0..count {
                for descriptor in sensor_types::install_fields(category) {
                    push_entity(
                        &mut entities,
                        connection_id,
                        data,
                        category,
                        InstallIndex::At(n),
                        config.effective(descriptor),
                    );
                }
            }
        }
        for descriptor in sensor_types::aggregate_fields(category) {
            push_entity(
                &mut entities,
                connection_id,
                data,
                category,
                InstallIndex::Aggregate,
                config.effective(descriptor),
            );
        }
    }
    entities
}

fn push_entity(
    entities: &mut Vec<EntityInstance>,
    connection_id: &str,
    data: &Value,
    category: Category,
    index: InstallIndex,
    descriptor: FieldDescriptor,
) {
    let field = match BoundField::bind(descriptor, matches!(index, InstallIndex::At(_))) {
        Ok(field) => field,
        Err(e) => {
            tracing::warn!(
                error = %e,
                key = descriptor.key,
                category = %category,
                "skipping sensor with invalid path template"
            );
            return;
        }
    };
    let stable_id = identity::stable_id(connection_id, data, category, index);
    entities.push(EntityInstance {
        connection_id: connection_id.to_string(),
        category,
        index,
        unique_id: format!("{stable_id}_{}", descriptor.key),
        name: display_name(descriptor.name, index),
        field,
    });
}
