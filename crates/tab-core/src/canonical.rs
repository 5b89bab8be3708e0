use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Encodes a value as JSON with map keys sorted and no insignificant
/// whitespace, so the same logical record always hashes to the same bytes
/// regardless of field insertion order. This is the encoding the audit
/// journal's hash chain commits to.
pub fn canonical_encode<T: Serialize>(value: &T) -> String {
    let v = serde_json::to_value(value).expect("value must serialize to JSON");
    let sorted = sort_value(v);
    serde_json::to_string(&sorted).expect("sorted value must serialize")
}

fn sort_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted = serde_json::Map::new();
            let mut keys: Vec<String> = map.keys().cloned().collect();
            keys.sort();
            for k in keys {
                sorted.insert(k.clone(), sort_value(map[&k].clone()));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_value).collect()),
        other => other,
    }
}

/// sha256 hex digest of the canonical encoding of `value`.
pub fn canonical_hash<T: Serialize>(value: &T) -> String {
    let encoded = canonical_encode(value);
    let mut hasher = Sha256::new();
    hasher.update(encoded.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_affect_encoding() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(canonical_encode(&a), canonical_encode(&b));
    }

    #[test]
    fn hash_is_sensitive_to_value_change() {
        let a = json!({"a": 1});
        let b = json!({"a": 2});
        assert_ne!(canonical_hash(&a), canonical_hash(&b));
    }
}
