use bytes::Bytes;

/// Deterministic key for tests and benchmarks.
pub fn get_test_key(i: usize) -> String {
  format!("jotdb-key-{:09}", i)
}

/// Deterministic JSON value payload for tests and benchmarks.
pub fn get_test_value(i: usize) -> Bytes {
  Bytes::from(format!("{{\"payload\":\"jotdb-value-{:09}\"}}", i))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_get_test_key_value() {
    assert_eq!(get_test_key(42), "jotdb-key-000000042");

    let value = get_test_value(42);
    let parsed: serde_json::Value = serde_json::from_slice(&value).unwrap();
    assert_eq!(parsed["payload"], "jotdb-value-000000042");
  }
}
