//! Firestore typed values.
//!
//! The REST API wraps every field in a single-key object naming its type:
//!
//! ```text
//! {"amount": 10, "tags": ["a"]}
//!
//! {"amount": {"integerValue": "10"},
//!  "tags":   {"arrayValue": {"values": [{"stringValue": "a"}]}}}
//! ```
//!
//! Encoding rejects what Firestore would reject, so bad input fails before
//! any request is sent: integers outside the i64 range, arrays nested
//! directly in arrays, empty field names and documents over 1 MiB.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

use crate::error::{Result, StoreError};
use crate::path::DocumentPath;
use crate::traits::Document;

/// Maximum encoded document size accepted by Firestore.
pub const MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

/// Encoded document fields.
pub type Fields = BTreeMap<String, FirestoreValue>;

/// One typed Firestore value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FirestoreValue {
    NullValue(()),
    BooleanValue(bool),
    /// 64-bit integers travel as decimal strings
    IntegerValue(String),
    DoubleValue(f64),
    StringValue(String),
    TimestampValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(LatLng),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<FirestoreValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: Fields,
}

/// Encode a JSON document into Firestore fields.
pub fn encode_document(path: &DocumentPath, doc: &Document) -> Result<Fields> {
    let size = serde_json::to_vec(doc)?.len();
    if size > MAX_DOCUMENT_BYTES {
        return Err(invalid(
            path,
            format!("document is {} bytes, limit is {}", size, MAX_DOCUMENT_BYTES),
        ));
    }

    encode_map(doc).map_err(|(field, reason)| invalid(path, format!("field '{}': {}", field, reason)))
}

/// Decode Firestore fields back into a JSON document.
pub fn decode_document(fields: Fields) -> Document {
    fields
        .into_iter()
        .map(|(name, value)| (name, value.into_json()))
        .collect()
}

impl FirestoreValue {
    /// Convert to plain JSON. Timestamps, bytes and references become strings.
    pub fn into_json(self) -> Value {
        match self {
            FirestoreValue::NullValue(()) => Value::Null,
            FirestoreValue::BooleanValue(b) => Value::Bool(b),
            FirestoreValue::IntegerValue(s) => match s.parse::<i64>() {
                Ok(n) => Value::Number(n.into()),
                Err(_) => Value::String(s),
            },
            FirestoreValue::DoubleValue(f) => {
                Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
            }
            FirestoreValue::StringValue(s)
            | FirestoreValue::TimestampValue(s)
            | FirestoreValue::BytesValue(s)
            | FirestoreValue::ReferenceValue(s) => Value::String(s),
            FirestoreValue::GeoPointValue(p) => serde_json::json!({
                "latitude": p.latitude,
                "longitude": p.longitude,
            }),
            FirestoreValue::ArrayValue(a) => {
                Value::Array(a.values.into_iter().map(FirestoreValue::into_json).collect())
            }
            FirestoreValue::MapValue(m) => Value::Object(decode_document(m.fields)),
        }
    }
}

fn invalid(path: &DocumentPath, reason: String) -> StoreError {
    StoreError::InvalidDocument {
        path: path.to_string(),
        reason,
    }
}

// Errors carry (dotted field path, reason) so the caller can prefix the document path.
type EncodeResult<T> = std::result::Result<T, (String, String)>;

fn encode_map(map: &serde_json::Map<String, Value>) -> EncodeResult<Fields> {
    let mut fields = Fields::new();
    for (name, value) in map {
        if name.is_empty() {
            return Err((String::new(), "field names must not be empty".to_string()));
        }
        let encoded = encode_value(value, false).map_err(|(inner, reason)| {
            let field = if inner.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", name, inner)
            };
            (field, reason)
        })?;
        fields.insert(name.clone(), encoded);
    }
    Ok(fields)
}

fn encode_value(value: &Value, in_array: bool) -> EncodeResult<FirestoreValue> {
    Ok(match value {
        Value::Null => FirestoreValue::NullValue(()),
        Value::Bool(b) => FirestoreValue::BooleanValue(*b),
        Value::Number(n) => encode_number(n)?,
        Value::String(s) => FirestoreValue::StringValue(s.clone()),
        Value::Array(items) => {
            if in_array {
                return Err((String::new(), "arrays cannot directly contain arrays".to_string()));
            }
            let values = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    encode_value(item, true).map_err(|(inner, reason)| {
                        let field = if inner.is_empty() {
                            format!("[{}]", i)
                        } else {
                            format!("[{}].{}", i, inner)
                        };
                        (field, reason)
                    })
                })
                .collect::<EncodeResult<Vec<_>>>()?;
            FirestoreValue::ArrayValue(ArrayValue { values })
        }
        Value::Object(map) => FirestoreValue::MapValue(MapValue {
            fields: encode_map(map)?,
        }),
    })
}

fn encode_number(n: &Number) -> EncodeResult<FirestoreValue> {
    if let Some(i) = n.as_i64() {
        Ok(FirestoreValue::IntegerValue(i.to_string()))
    } else if n.is_u64() {
        Err((String::new(), format!("integer {} is outside the 64-bit signed range", n)))
    } else {
        n.as_f64()
            .map(FirestoreValue::DoubleValue)
            .ok_or_else(|| (String::new(), format!("unsupported number {}", n)))
    }
}
