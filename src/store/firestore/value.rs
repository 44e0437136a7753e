//! Conversion between plain JSON and Firestore REST typed values
//! (`{"stringValue": "x"}`, `{"mapValue": {"fields": {...}}}`, ...).

use serde_json::{json, Map, Number, Value};

use crate::store::{DocumentFields, StoreError};

/// Encode a plain JSON value as a Firestore typed value.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // int64 travels as a decimal string
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => json!({
            "arrayValue": { "values": values.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

/// Encode document fields as a Firestore `fields` object.
pub fn encode_fields(fields: &DocumentFields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

fn codec_error(detail: impl std::fmt::Display) -> StoreError {
    StoreError::Codec(detail.to_string())
}

fn decode_double(raw: &Value) -> Result<Value, StoreError> {
    match raw {
        Value::Number(n) => Ok(Value::Number(n.clone())),
        // NaN and the infinities arrive as strings
        Value::String(s) => {
            let parsed: f64 = s
                .parse()
                .map_err(|_| codec_error(format_args!("bad doubleValue {:?}", s)))?;
            Ok(Number::from_f64(parsed)
                .map(Value::Number)
                .unwrap_or_else(|| {
                    if parsed.is_nan() {
                        Value::Null
                    } else {
                        Value::String(s.clone())
                    }
                }))
        }
        other => Err(codec_error(format_args!("bad doubleValue {}", other))),
    }
}

fn decode_integer(raw: &Value) -> Result<Value, StoreError> {
    match raw {
        Value::String(s) => s
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| codec_error(format_args!("bad integerValue {:?}", s))),
        Value::Number(n) if n.is_i64() => Ok(Value::Number(n.clone())),
        other => Err(codec_error(format_args!("bad integerValue {}", other))),
    }
}

/// Decode a Firestore typed value into plain JSON.
///
/// Timestamps, references and bytes decode to their string forms; geo
/// points decode to `{latitude, longitude}`.
pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let typed = value
        .as_object()
        .filter(|obj| obj.len() == 1)
        .ok_or_else(|| codec_error(format_args!("expected a single typed value, got {}", value)))?;

    let (kind, raw) = typed
        .iter()
        .next()
        .ok_or_else(|| codec_error("empty typed value"))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => raw
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| codec_error(format_args!("bad booleanValue {}", raw))),
        "integerValue" => decode_integer(raw),
        "doubleValue" => decode_double(raw),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => raw
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| codec_error(format_args!("bad {} {}", kind, raw))),
        "geoPointValue" => Ok(json!({
            "latitude": raw.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": raw.get("longitude").cloned().unwrap_or(json!(0.0)),
        })),
        "arrayValue" => match raw.get("values") {
            None => Ok(Value::Array(Vec::new())),
            Some(Value::Array(values)) => values
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Some(other) => Err(codec_error(format_args!("bad arrayValue {}", other))),
        },
        "mapValue" => match raw.get("fields") {
            None => Ok(Value::Object(Map::new())),
            Some(Value::Object(fields)) => decode_fields(fields).map(Value::Object),
            Some(other) => Err(codec_error(format_args!("bad mapValue {}", other))),
        },
        other => Err(codec_error(format_args!("unknown value type {}", other))),
    }
}

/// Decode a Firestore `fields` object into plain document fields.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<DocumentFields, StoreError> {
    fields
        .iter()
        .map(|(key, value)| decode_value(value).map(|decoded| (key.clone(), decoded)))
        .collect()
}
