//! Hashing System - SHA-256 Fingerprints for Validation Outcomes
//!
//! A build gate compares fingerprints to detect whether a run's results changed.

use sha2::{Digest, Sha256};
use serde::Serialize;
use serde_json::{to_string, Value};

use crate::validation::DetailedConsistencyResult;
use crate::ENGINE_VERSION;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Convert to canonical JSON (sorted keys, no whitespace).
/// Non-finite floats serialize as `null`.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    let sorted = sort_value(&v);
    to_string(&sorted)
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let sorted_map: serde_json::Map<String, Value> = sorted
                .into_iter()
                .map(|(k, v)| (k.clone(), sort_value(v)))
                .collect();
            Value::Object(sorted_map)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// fingerprint = sha256(engine_version + ":" + canonical_results)
pub fn compute_results_fingerprint(
    results: &[DetailedConsistencyResult],
) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(&results)?;
    let combined = format!("{}:{}", ENGINE_VERSION, canonical);
    Ok(sha256_hex(combined.as_bytes()))
}
