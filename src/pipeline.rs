// Raw snapshot value -> sensor value: null policy, timestamp coercion, unit factor.
// Malformed values degrade to `Reading::Absent` for that field only.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde_json::Value;

use crate::models::{FieldDescriptor, NonePolicy, Reading, SensorValue};
use crate::snapshot::is_truthy;

pub fn transform(raw: Option<&Value>, descriptor: &FieldDescriptor) -> Reading {
    let Some(raw) = raw.filter(|v| !v.is_null()) else {
        return match descriptor.none_policy {
            Some(NonePolicy::TreatAsZero) => Reading::Value(SensorValue::Number(0.0)),
            Some(NonePolicy::KeepPrevious) => Reading::Suppressed,
            Some(NonePolicy::TreatAsAbsent) | None => Reading::Absent,
        };
    };

    match convert(raw, descriptor) {
        Some(value) => Reading::Value(value),
        // keep-previous applies to the transformed value, so a malformed
        // reading also keeps the last good one
        None if descriptor.none_policy == Some(NonePolicy::KeepPrevious) => Reading::Suppressed,
        None => Reading::Absent,
    }
}

fn convert(raw: &Value, descriptor: &FieldDescriptor) -> Option<SensorValue> {
    if descriptor.is_timestamp() {
        return raw
            .as_str()
            .and_then(parse_timestamp)
            .map(SensorValue::Timestamp);
    }

    let value = scalar(raw)?;
    // zero, "" and false pass through unscaled
    if !is_truthy(raw) {
        return Some(value);
    }
    match descriptor.value_factor {
        Some(factor) => scale(&value, factor),
        None => Some(value),
    }
}

fn scalar(raw: &Value) -> Option<SensorValue> {
    match raw {
        Value::Bool(b) => Some(SensorValue::Bool(*b)),
        Value::Number(n) => n.as_f64().map(SensorValue::Number),
        Value::String(s) => Some(SensorValue::Text(s.clone())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn scale(value: &SensorValue, factor: f64) -> Option<SensorValue> {
    let number = match value {
        SensorValue::Number(n) => *n,
        SensorValue::Text(s) => s.trim().parse::<f64>().ok()?,
        SensorValue::Bool(_) | SensorValue::Timestamp(_) => return None,
    };
    Some(SensorValue::Number(number * factor))
}

/// Parse an ISO-8601 datetime. Values without an offset are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    None
}

/// Last-reset instant for a resolved value; falsy or unparsable values give `None`.
pub fn last_reset(raw: Option<&Value>) -> Option<DateTime<FixedOffset>> {
    raw.filter(|v| is_truthy(v))
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
}
