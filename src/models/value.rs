// Sensor values and pipeline outcomes

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// A transformed sensor value; serializes as a plain JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Timestamp(DateTime<FixedOffset>),
}

impl SensorValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SensorValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Result of running a raw value through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Value(SensorValue),
    Absent,
    /// Keep the prior published value and skip republishing this cycle.
    Suppressed,
}

impl Reading {
    /// The value to publish, if this reading publishes at all.
    pub fn into_published(self) -> Option<Option<SensorValue>> {
        match self {
            Reading::Value(v) => Some(Some(v)),
            Reading::Absent => Some(None),
            Reading::Suppressed => None,
        }
    }
}

/// Last value this core published for an entity, and when.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedState {
    pub value: Option<SensorValue>,
    pub published_at: DateTime<Utc>,
}
