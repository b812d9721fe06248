//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! The REST API wraps every value in a single-key object naming its type,
//! e.g. `{"integerValue": "5"}` or `{"mapValue": {"fields": {...}}}`.
//! Integers travel as strings; timestamps, references and bytes are decoded
//! to plain strings since the pipeline treats them as opaque text.

use super::StoreError;
use crate::types::Document;
use serde_json::{json, Map, Number, Value};

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            // u64 beyond i64 range has no integer representation in Firestore
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(document: &Document) -> Document {
    document
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let typed = value
        .as_object()
        .ok_or_else(|| StoreError::Value(format!("expected typed object, got {value}")))?;
    let (kind, inner) = typed
        .iter()
        .next()
        .ok_or_else(|| StoreError::Value("empty typed value".to_string()))?;

    let mismatch = || StoreError::Value(format!("{kind} holds {inner}"));

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner.as_bool().map(Value::Bool).ok_or_else(mismatch),
        "integerValue" => match inner {
            Value::String(s) => s.parse::<i64>().map(Value::from).map_err(|_| mismatch()),
            Value::Number(n) if n.is_i64() => Ok(Value::Number(n.clone())),
            _ => Err(mismatch()),
        },
        "doubleValue" => match inner {
            Value::Number(n) => Ok(Value::Number(n.clone())),
            // NaN and infinities arrive as strings and have no JSON form
            Value::String(s) => Ok(s
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null)),
            _ => Err(mismatch()),
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(mismatch),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>, _>>()?,
                Some(_) => return Err(mismatch()),
                None => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = match inner.get("fields") {
                Some(Value::Object(fields)) => decode_fields(fields)?,
                Some(_) => return Err(mismatch()),
                None => Map::new(),
            };
            Ok(Value::Object(fields))
        }
        other => Err(StoreError::Value(format!("unsupported value type {other}"))),
    }
}

pub fn decode_fields(fields: &Document) -> Result<Document, StoreError> {
    fields
        .iter()
        .map(|(key, value)| decode_value(value).map(|decoded| (key.clone(), decoded)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode_value(&json!(5)), json!({"integerValue": "5"}));
        assert_eq!(encode_value(&json!(-2)), json!({"integerValue": "-2"}));
        assert_eq!(encode_value(&json!(1.5)), json!({"doubleValue": 1.5}));
        assert_eq!(encode_value(&json!("salt")), json!({"stringValue": "salt"}));
        assert_eq!(encode_value(&json!(true)), json!({"booleanValue": true}));
        assert_eq!(encode_value(&Value::Null), json!({"nullValue": null}));
    }

    #[test]
    fn test_recipe_document_survives_encoding() {
        let recipe = json!({
            "id": "synthetic_001",
            "title": "Synthetic Recipe 1",
            "servings": 2,
            "prep_minutes": 12,
            "rating": 4.5,
            "ingredients": [{"name": "flour", "quantity": 100, "unit": "g"}],
            "steps": ["Step 1", "Step 2"],
            "tags": [],
            "notes": null
        });
        let fields = recipe.as_object().unwrap();
        let decoded = decode_fields(&encode_fields(fields)).unwrap();
        assert_eq!(Value::Object(decoded), recipe);
    }

    #[test]
    fn test_decode_emulator_specific_shapes() {
        // Empty arrays and maps omit their inner key entirely
        assert_eq!(decode_value(&json!({"arrayValue": {}})).unwrap(), json!([]));
        assert_eq!(decode_value(&json!({"mapValue": {}})).unwrap(), json!({}));
        assert_eq!(
            decode_value(&json!({"timestampValue": "2024-05-01T10:00:00Z"})).unwrap(),
            json!("2024-05-01T10:00:00Z")
        );
        assert_eq!(decode_value(&json!({"doubleValue": "NaN"})).unwrap(), Value::Null);
    }

    #[test]
    fn test_decode_rejects_malformed_values() {
        assert!(decode_value(&json!("bare")).is_err());
        assert!(decode_value(&json!({})).is_err());
        assert!(decode_value(&json!({"integerValue": "five"})).is_err());
        assert!(decode_value(&json!({"mysteryValue": 1})).is_err());
    }
}
