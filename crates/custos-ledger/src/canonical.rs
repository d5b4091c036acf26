//! Canonical encoding of structured records.
//!
//! Two logically equal records must serialize to identical bytes no matter
//! how they were constructed, because those bytes feed the content hasher.
//! The encoding is JSON with one extra rule on top of what serde gives us:
//! object keys are written in lexicographic order at every nesting depth.
//! Array element order is the caller's order and is preserved.
//!
//! Timestamps are pre-rendered by callers to RFC 3339 with millisecond
//! precision before they reach this module, so a record is always a plain
//! JSON value by the time it is encoded.

use std::collections::BTreeMap;

use serde_json::Value;

use custos_contracts::error::{CustosError, CustosResult};

/// A flat record of named fields awaiting canonical encoding.
///
/// `BTreeMap` keeps the top-level keys in lexicographic order by
/// construction; `encode` enforces the same order on nested objects.
pub type CanonicalRecord = BTreeMap<String, Value>;

/// Serialize `record` to canonical bytes.
///
/// The output is compact JSON (no whitespace) with all object keys sorted
/// lexicographically, recursively. Returns `CustosError::Encoding` if any
/// field holds a value JSON cannot represent — the caller must treat that
/// as fatal for the record, never substitute a default.
pub fn encode(record: &CanonicalRecord) -> CustosResult<Vec<u8>> {
    let mut out = Vec::with_capacity(128);
    out.push(b'{');
    let mut first = true;
    for (key, value) in record {
        if !first {
            out.push(b',');
        }
        first = false;
        write_string(key, &mut out)?;
        out.push(b':');
        write_value(value, &mut out)?;
    }
    out.push(b'}');
    Ok(out)
}

/// Convert any serializable value into a canonical record field.
///
/// Wraps `serde_json::to_value`, mapping serialization failures (custom
/// `Serialize` impls, non-string map keys, non-finite floats) into
/// `CustosError::Encoding`.
pub fn to_field<T: serde::Serialize>(value: &T) -> CustosResult<Value> {
    serde_json::to_value(value).map_err(|e| CustosError::Encoding {
        reason: format!("value is not JSON-representable: {}", e),
    })
}

// ── Recursive writer ──────────────────────────────────────────────────────────

fn write_value(value: &Value, out: &mut Vec<u8>) -> CustosResult<()> {
    match value {
        Value::Object(map) => {
            // serde_json's map may or may not preserve insertion order
            // depending on features; sorting here makes the encoding
            // independent of either choice.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push(b'{');
            let mut first = true;
            for key in keys {
                if !first {
                    out.push(b',');
                }
                first = false;
                write_string(key, out)?;
                out.push(b':');
                write_value(&map[key], out)?;
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            let mut first = true;
            for item in items {
                if !first {
                    out.push(b',');
                }
                first = false;
                write_value(item, out)?;
            }
            out.push(b']');
        }
        // Scalars already have a single canonical JSON rendering.
        scalar => {
            let bytes = serde_json::to_vec(scalar).map_err(|e| CustosError::Encoding {
                reason: format!("scalar serialization failed: {}", e),
            })?;
            out.extend_from_slice(&bytes);
        }
    }
    Ok(())
}

fn write_string(s: &str, out: &mut Vec<u8>) -> CustosResult<()> {
    let bytes = serde_json::to_vec(s).map_err(|e| CustosError::Encoding {
        reason: format!("string serialization failed: {}", e),
    })?;
    out.extend_from_slice(&bytes);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn top_level_keys_are_sorted() {
        let mut record = CanonicalRecord::new();
        record.insert("zeta".to_string(), json!(1));
        record.insert("alpha".to_string(), json!(2));

        let bytes = encode(&record).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"alpha":2,"zeta":1}"#
        );
    }

    #[test]
    fn nested_object_keys_are_sorted() {
        let mut record = CanonicalRecord::new();
        record.insert(
            "data".to_string(),
            json!({ "b": { "y": 1, "x": 2 }, "a": 3 }),
        );

        let bytes = encode(&record).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"data":{"a":3,"b":{"x":2,"y":1}}}"#
        );
    }

    #[test]
    fn array_order_is_preserved() {
        let mut record = CanonicalRecord::new();
        record.insert("items".to_string(), json!([3, 1, 2]));

        let bytes = encode(&record).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"items":[3,1,2]}"#);
    }

    #[test]
    fn insertion_order_does_not_affect_encoding() {
        let mut a = CanonicalRecord::new();
        a.insert("one".to_string(), json!("1"));
        a.insert("two".to_string(), json!("2"));

        let mut b = CanonicalRecord::new();
        b.insert("two".to_string(), json!("2"));
        b.insert("one".to_string(), json!("1"));

        assert_eq!(encode(&a).unwrap(), encode(&b).unwrap());
    }

    #[test]
    fn string_escaping_is_canonical() {
        let mut record = CanonicalRecord::new();
        record.insert("text".to_string(), json!("line\nbreak \"quoted\""));

        let bytes = encode(&record).unwrap();
        // Must match serde_json's escaping exactly.
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"text":"line\nbreak \"quoted\""}"#
        );
    }

    #[test]
    fn to_field_rejects_unrepresentable_values() {
        // JSON object keys must be strings; tuple keys cannot be encoded.
        let mut bad = std::collections::BTreeMap::new();
        bad.insert((1u8, 2u8), "value");

        let err = to_field(&bad).unwrap_err();
        assert!(matches!(
            err,
            custos_contracts::error::CustosError::Encoding { .. }
        ));
    }
}
