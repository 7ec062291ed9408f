use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::errors::{Errors, Result};

/// One entry of a collection's append-only log, stored as a single JSON line.
///
/// A record with `tombstone` set carries no meaningful value and marks `key`
/// as deleted; any other record is the full value for `key`, superseding every
/// record before it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
  pub collection: String,

  pub key: String,

  pub value: Value,

  #[serde(with = "time::serde::rfc3339")]
  pub ts: OffsetDateTime,

  pub tombstone: bool,
}

impl LogRecord {
  pub fn normal(collection: String, key: String, value: Value) -> Self {
    Self {
      collection,
      key,
      value,
      ts: OffsetDateTime::now_utc(),
      tombstone: false,
    }
  }

  pub fn deleted(collection: String, key: String) -> Self {
    Self {
      collection,
      key,
      value: Value::Null,
      ts: OffsetDateTime::now_utc(),
      tombstone: true,
    }
  }

  /// Serializes the record to one self-delimited line, without the trailing
  /// newline. The output is compact JSON, so no line terminator can appear
  /// inside the encoding.
  pub fn encode(&self) -> Result<Vec<u8>> {
    serde_json::to_vec(self).map_err(|e| {
      log::error!("failed to encode log record: {}", e);
      Errors::FailedToEncodeRecord
    })
  }

  pub fn decode(buf: &[u8]) -> Result<LogRecord> {
    serde_json::from_slice(buf).map_err(|e| Errors::CorruptLogRecord(e.to_string()))
  }

  /// The record's value payload as compact JSON bytes, the form kept in a
  /// collection's index.
  pub fn value_bytes(&self) -> Result<Bytes> {
    let buf = serde_json::to_vec(&self.value).map_err(|e| {
      log::error!("failed to encode record value: {}", e);
      Errors::FailedToEncodeRecord
    })?;
    Ok(Bytes::from(buf))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_encode_is_one_line() {
    let value: Value = serde_json::from_str("{\n  \"x\": 1,\n  \"y\": [1, 2]\n}").unwrap();
    let record = LogRecord::normal("default".to_string(), "a".to_string(), value);

    let encoded = record.encode().unwrap();
    assert!(!encoded.is_empty());
    assert!(!encoded.contains(&b'\n'));
  }

  #[test]
  fn test_encode_decode_roundtrip() {
    let value: Value = serde_json::from_str(r#"{"x":1,"s":"hi"}"#).unwrap();
    let record = LogRecord::normal("users".to_string(), "u-1".to_string(), value.clone());

    let encoded = record.encode().unwrap();
    let decoded = LogRecord::decode(&encoded).unwrap();

    assert_eq!(decoded.collection, "users");
    assert_eq!(decoded.key, "u-1");
    assert_eq!(decoded.value, value);
    assert_eq!(decoded.ts, record.ts);
    assert!(!decoded.tombstone);
  }

  #[test]
  fn test_decode_corrupt_line() {
    let res = LogRecord::decode(b"{\"collection\":\"default\",\"key\"");
    assert!(matches!(res, Err(Errors::CorruptLogRecord(_))));

    let res = LogRecord::decode(b"not json at all");
    assert!(matches!(res, Err(Errors::CorruptLogRecord(_))));
  }

  #[test]
  fn test_decode_existing_log_line() {
    // A line as previous deployments wrote it.
    let line = br#"{"collection":"default","key":"a","value":{"x":2},"ts":"2024-05-06T07:08:09.123456789Z","tombstone":false}"#;
    let record = LogRecord::decode(line).unwrap();

    assert_eq!(record.collection, "default");
    assert_eq!(record.key, "a");
    assert_eq!(record.value_bytes().unwrap(), Bytes::from_static(b"{\"x\":2}"));
    assert_eq!(record.ts.year(), 2024);
    assert!(!record.tombstone);
  }

  #[test]
  fn test_tombstone_has_null_value() {
    let record = LogRecord::deleted("default".to_string(), "gone".to_string());
    assert!(record.tombstone);
    assert_eq!(record.value, Value::Null);

    let decoded = LogRecord::decode(&record.encode().unwrap()).unwrap();
    assert!(decoded.tombstone);
    assert_eq!(decoded.value, Value::Null);
  }
}
