// Static per-field sensor configuration

use serde::{Deserialize, Serialize};

/// What to do when the addressed value is absent or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonePolicy {
    TreatAsZero,
    KeepPrevious,
    TreatAsAbsent,
}

/// Semantic type tag; drives coercion of the raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Timestamp,
}

/// Extra state attribute: label plus path template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeDescriptor {
    pub label: &'static str,
    pub path: &'static str,
}

/// Describes one sensor type. Path templates may contain `{install_index}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub path: &'static str,
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub value_factor: Option<f64>,
    pub last_reset_path: Option<&'static str>,
    pub attributes: &'static [AttributeDescriptor],
    pub none_policy: Option<NonePolicy>,
    pub semantic_type: Option<SemanticType>,
    /// Hour of day (0-23) after which the value may refresh once per day.
    pub daily_update_hour: Option<u32>,
}

impl FieldDescriptor {
    pub const fn new(key: &'static str, path: &'static str, name: &'static str) -> Self {
        Self {
            key,
            path,
            name,
            unit: None,
            value_factor: None,
            last_reset_path: None,
            attributes: &[],
            none_policy: None,
            semantic_type: None,
            daily_update_hour: None,
        }
    }

    pub const fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    pub const fn with_factor(mut self, factor: f64) -> Self {
        self.value_factor = Some(factor);
        self
    }

    pub const fn with_last_reset(mut self, path: &'static str) -> Self {
        self.last_reset_path = Some(path);
        self
    }

    pub const fn with_attributes(mut self, attributes: &'static [AttributeDescriptor]) -> Self {
        self.attributes = attributes;
        self
    }

    pub const fn with_none_policy(mut self, policy: NonePolicy) -> Self {
        self.none_policy = Some(policy);
        self
    }

    pub const fn timestamp(mut self) -> Self {
        self.semantic_type = Some(SemanticType::Timestamp);
        self
    }

    pub const fn with_daily_update_hour(mut self, hour: u32) -> Self {
        self.daily_update_hour = Some(hour);
        self
    }

    pub fn is_timestamp(&self) -> bool {
        self.semantic_type == Some(SemanticType::Timestamp)
    }
}
