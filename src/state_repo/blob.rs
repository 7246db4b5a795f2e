// Published value BLOBs: [version: u8][wincode ValueRecord].

use wincode::{SchemaRead, SchemaWrite};

use crate::models::SensorValue;
use crate::pipeline::parse_timestamp;

pub(super) const BLOB_VERSION: u8 = 1;

const KIND_ABSENT: u8 = 0;
const KIND_BOOL: u8 = 1;
const KIND_NUMBER: u8 = 2;
const KIND_TEXT: u8 = 3;
const KIND_TIMESTAMP: u8 = 4;

/// Flat encoding of `Option<SensorValue>`; timestamps stored as RFC 3339 text.
#[derive(Debug, Clone, PartialEq, SchemaRead, SchemaWrite)]
struct ValueRecord {
    kind: u8,
    number: f64,
    text: String,
}

impl ValueRecord {
    fn from_value(value: Option<&SensorValue>) -> Self {
        let (kind, number, text) = match value {
            None => (KIND_ABSENT, 0.0, String::new()),
            Some(SensorValue::Bool(b)) => (KIND_BOOL, if *b { 1.0 } else { 0.0 }, String::new()),
            Some(SensorValue::Number(n)) => (KIND_NUMBER, *n, String::new()),
            Some(SensorValue::Text(s)) => (KIND_TEXT, 0.0, s.clone()),
            Some(SensorValue::Timestamp(t)) => (KIND_TIMESTAMP, 0.0, t.to_rfc3339()),
        };
        Self { kind, number, text }
    }

    fn into_value(self) -> anyhow::Result<Option<SensorValue>> {
        Ok(match self.kind {
            KIND_ABSENT => None,
            KIND_BOOL => Some(SensorValue::Bool(self.number != 0.0)),
            KIND_NUMBER => Some(SensorValue::Number(self.number)),
            KIND_TEXT => Some(SensorValue::Text(self.text)),
            KIND_TIMESTAMP => Some(SensorValue::Timestamp(
                parse_timestamp(&self.text)
                    .ok_or_else(|| anyhow::anyhow!("bad stored timestamp {:?}", self.text))?,
            )),
            other => anyhow::bail!("unknown stored value kind {}", other),
        })
    }
}

pub(super) fn encode_value(value: Option<&SensorValue>) -> anyhow::Result<Vec<u8>> {
    let payload = wincode::serialize(&ValueRecord::from_value(value))
        .map_err(|e| anyhow::anyhow!("wincode: {}", e))?;
    Ok(with_version_prefix(BLOB_VERSION, payload))
}

pub(super) fn decode_value(bytes: &[u8]) -> anyhow::Result<Option<SensorValue>> {
    anyhow::ensure!(
        blob_version(bytes) == BLOB_VERSION,
        "unsupported value blob version {}",
        blob_version(bytes)
    );
    let record: ValueRecord = wincode::deserialize(&bytes[1..])
        .map_err(|e| anyhow::anyhow!("wincode deserialize value: {}", e))?;
    record.into_value()
}

fn with_version_prefix(version: u8, payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(version);
    out.extend_from_slice(&payload);
    out
}

fn blob_version(bytes: &[u8]) -> u8 {
    bytes.first().copied().unwrap_or(0)
}
