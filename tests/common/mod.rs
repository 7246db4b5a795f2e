// Shared test helpers

#![allow(dead_code)]

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use zonneplan::snapshot::ConnectionSnapshots;

pub const CONNECTION_ID: &str = "conn-1";

/// One connection with a summary, two PV installations, one P1 meter,
/// one charge point and the three totals documents.
pub fn connection_data() -> Value {
    json!({
        "summary_data": {
            "usage": { "value": 1200, "measured_at": "2024-06-01T09:55:00.000000Z" },
            "effective_price": 2_500_000,
            "price_per_hour": [{ "datetime": "2024-06-01T10:00:00Z", "electricity_price": 2_400_000 }],
            "gas_price": 12_000_000,
            "gas_price_next": 12_500_000,
            "sustainability_score": 765,
            "tariff_group": "normal",
            "status_message": "Goed bezig",
            "status_tip": null
        },
        "pv_installation": [
            {
                "uuid": "pv-a",
                "label": "Roof",
                "meta": {
                    "name": "Roof East",
                    "module_firmware_version": "1.2",
                    "inverter_firmware_version": "3.4",
                    "total_power_measured": 1_234_000,
                    "last_measured_at": "2024-06-01T09:50:00.000000Z",
                    "first_measured_at": "2022-03-01T12:00:00.000000Z",
                    "last_measured_power_value": 850,
                    "installation_wp": 4200,
                    "expected_surplus_kwh": 6
                }
            },
            {
                "uuid": "pv-b",
                "label": "Shed",
                "meta": {
                    "name": "Shed West",
                    "module_firmware_version": null,
                    "total_power_measured": 321_000,
                    "last_measured_power_value": null,
                    "installation_wp": 1800
                }
            }
        ],
        "p1_installation": [
            {
                "uuid": "p1-a",
                "label": "Meter",
                "meta": {
                    "sgn_serial_number": "SN123",
                    "sgn_firmware": "5.0",
                    "electricity_last_measured_delivery_value": 430,
                    "electricity_last_measured_production_value": 0,
                    "electricity_last_measured_average_value": 512,
                    "electricity_first_measured_at": "2021-01-01T00:00:00.000000Z",
                    "electricity_last_measured_at": "2024-06-01T09:59:00.000000Z",
                    "gas_first_measured_at": "2021-01-01T00:00:00.000000Z",
                    "gas_last_measured_at": "2024-06-01T09:00:00.000000Z"
                }
            }
        ],
        "charge_point_installation": [
            {
                "uuid": "cp-a",
                "label": "Driveway",
                "meta": { "serial_number": "CP-9" },
                "state": {
                    "state": "Charging",
                    "power_actual": 7400,
                    "energy_delivered_session": 12_500,
                    "start_mode": "Boost",
                    "connectivity_state": true,
                    "session_started_at": "2024-06-01T08:00:00+00:00"
                }
            }
        ],
        "pv_data": {
            "measurement_groups": [
                { "date": "2024-06-01T00:00:00+02:00", "total": 5_400 },
                { "date": "2024-05-31T00:00:00+02:00", "total": 18_200 }
            ]
        },
        "electricity_data": {
            "measurement_groups": [
                { "date": "2024-06-01T00:00:00+02:00", "meta": { "delivery": 3_100, "production": 2_000 } }
            ]
        },
        "gas_data": {
            "measurement_groups": [
                { "date": "2024-06-01T00:00:00+02:00", "total": 1_250 }
            ]
        }
    })
}

pub fn snapshots_of(connections: &[(&str, Value)]) -> ConnectionSnapshots {
    let map: BTreeMap<String, Value> = connections
        .iter()
        .map(|(id, data)| (id.to_string(), data.clone()))
        .collect();
    ConnectionSnapshots::new(Utc::now(), map)
}

/// Fixed +02:00 clock (CEST) for deterministic gate decisions.
pub fn cest(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
}

/// Set a value at a dotted path inside `data`.
pub fn set_path(data: &mut Value, path: &str, value: Value) {
    let mut node = data;
    let parts: Vec<&str> = path.split('.').collect();
    for part in &parts[..parts.len() - 1] {
        node = match part.parse::<usize>() {
            Ok(i) if node.is_array() => &mut node[i],
            _ => &mut node[*part],
        };
    }
    let last = parts[parts.len() - 1];
    match last.parse::<usize>() {
        Ok(i) if node.is_array() => node[i] = value,
        _ => node[last] = value,
    }
}

/// Remove a key at a dotted path.
pub fn remove_path(data: &mut Value, path: &str) {
    let (parent, key) = path.rsplit_once('.').unwrap_or(("", path));
    let node = if parent.is_empty() {
        data
    } else {
        parent.split('.').fold(data, |node, part| match part.parse::<usize>() {
            Ok(i) if node.is_array() => &mut node[i],
            _ => &mut node[part],
        })
    };
    if let Some(map) = node.as_object_mut() {
        map.remove(key);
    }
}
