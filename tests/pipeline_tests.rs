// Value pipeline: null policies, timestamp coercion, unit factor

use chrono::{TimeZone, Utc};
use serde_json::json;
use zonneplan::models::{FieldDescriptor, NonePolicy, Reading, SensorValue};
use zonneplan::pipeline::transform;

const PLAIN: FieldDescriptor = FieldDescriptor::new("plain", "a.b", "Plain");

fn number(reading: Reading) -> f64 {
    match reading {
        Reading::Value(SensorValue::Number(n)) => n,
        other => panic!("expected a number, got {other:?}"),
    }
}

#[test]
fn treat_as_zero_substitutes_zero_for_absent_and_null() {
    let d = PLAIN.with_none_policy(NonePolicy::TreatAsZero);
    assert_eq!(transform(None, &d), Reading::Value(SensorValue::Number(0.0)));
    assert_eq!(transform(Some(&json!(null)), &d), Reading::Value(SensorValue::Number(0.0)));
}

#[test]
fn keep_previous_suppresses_absent() {
    let d = PLAIN.with_none_policy(NonePolicy::KeepPrevious);
    assert_eq!(transform(None, &d), Reading::Suppressed);
    assert_eq!(transform(Some(&json!(null)), &d), Reading::Suppressed);
}

#[test]
fn keep_previous_suppresses_malformed_value() {
    let d = PLAIN
        .with_none_policy(NonePolicy::KeepPrevious)
        .with_factor(0.001);
    assert_eq!(transform(Some(&json!("n/a")), &d), Reading::Suppressed);
}

#[test]
fn no_policy_leaves_absent() {
    assert_eq!(transform(None, &PLAIN), Reading::Absent);
    assert_eq!(
        transform(None, &PLAIN.with_none_policy(NonePolicy::TreatAsAbsent)),
        Reading::Absent
    );
}

#[test]
fn factor_scales_non_zero_values() {
    let d = PLAIN.with_factor(0.5);
    assert_eq!(number(transform(Some(&json!(10)), &d)), 5.0);
    assert_eq!(number(transform(Some(&json!("10")), &d)), 5.0);
}

#[test]
fn zero_is_never_scaled() {
    let d = PLAIN.with_factor(0.5);
    assert_eq!(number(transform(Some(&json!(0)), &d)), 0.0);
    assert_eq!(
        transform(Some(&json!("")), &d),
        Reading::Value(SensorValue::Text(String::new()))
    );
    assert_eq!(
        transform(Some(&json!(false)), &d),
        Reading::Value(SensorValue::Bool(false))
    );
}

#[test]
fn non_numeric_value_with_factor_is_absent() {
    let d = PLAIN.with_factor(0.5);
    assert_eq!(transform(Some(&json!("abc")), &d), Reading::Absent);
    assert_eq!(transform(Some(&json!(true)), &d), Reading::Absent);
}

#[test]
fn values_without_factor_pass_through() {
    assert_eq!(
        transform(Some(&json!("normal")), &PLAIN),
        Reading::Value(SensorValue::Text("normal".into()))
    );
    assert_eq!(
        transform(Some(&json!(true)), &PLAIN),
        Reading::Value(SensorValue::Bool(true))
    );
    assert_eq!(number(transform(Some(&json!(1200)), &PLAIN)), 1200.0);
}

#[test]
fn containers_are_not_sensor_values() {
    assert_eq!(transform(Some(&json!([1, 2])), &PLAIN), Reading::Absent);
    assert_eq!(transform(Some(&json!({ "a": 1 })), &PLAIN), Reading::Absent);
}

#[test]
fn timestamp_fields_parse_iso_8601() {
    let d = PLAIN.timestamp();
    let expected = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
    match transform(Some(&json!("2024-01-01T10:00:00+00:00")), &d) {
        Reading::Value(SensorValue::Timestamp(t)) => assert_eq!(t, expected),
        other => panic!("expected timestamp, got {other:?}"),
    }
}

#[test]
fn unparsable_timestamp_is_absent() {
    let d = PLAIN.timestamp();
    assert_eq!(transform(Some(&json!("not-a-date")), &d), Reading::Absent);
    assert_eq!(transform(Some(&json!("")), &d), Reading::Absent);
    assert_eq!(transform(Some(&json!(1_700_000_000)), &d), Reading::Absent);
}

#[test]
fn transform_is_deterministic() {
    let d = PLAIN.with_factor(0.001);
    let raw = json!(1_234_000);
    let first = transform(Some(&raw), &d);
    for _ in 0..3 {
        assert_eq!(transform(Some(&raw), &d), first);
    }
}
