//! Record sets: the decoded input file.
//!
//! The input is one JSON object whose keys are document ids and whose values
//! are the documents:
//!
//! ```json
//! {"a": {"amount": 10}, "b": {"amount": 20}}
//! ```
//!
//! Decoding keeps the keys in file order, which is the upload order, and
//! rejects duplicate keys, invalid document ids and non-object values. A
//! non-object value is reported at its own line and column; key errors carry
//! the position where decoding stopped.

use docport_store::{validate_document_id, Document};
use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::error::ConfigError;

/// One keyed record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: String,
    pub value: Document,
}

impl Record {
    pub fn new(key: impl Into<String>, value: Document) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Ordered, duplicate-free sequence of records.
///
/// Node's `for...in` over a parsed object visits integer-like keys first in
/// ascending order and `JSON.parse` keeps the last value of a repeated key.
/// A `RecordSet` does neither: keys stay in file order and a repeated key is
/// an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records already in memory, applying the same checks as decoding.
    pub fn from_records(records: Vec<Record>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            check_key(&record.key, &mut seen).map_err(|reason| ConfigError::Record {
                key: record.key.clone(),
                reason,
            })?;
        }
        Ok(Self { records })
    }

    /// Read and decode a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let records = Self::from_json_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!("Loaded {} records from {}", records.len(), path.display());
        Ok(records)
    }

    /// Decode from a JSON string.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Keys in upload order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Document> {
        self.records.iter().find(|r| r.key == key).map(|r| &r.value)
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn check_key(key: &str, seen: &mut HashSet<String>) -> Result<(), String> {
    if !seen.insert(key.to_string()) {
        return Err("duplicate key".to_string());
    }
    validate_document_id(key).map_err(|e| match e {
        docport_store::StoreError::InvalidPath { reason, .. } => reason,
        other => other.to_string(),
    })
}

/// Decodes one record value, which must be a JSON object. Errors raised here
/// carry the position of the value.
struct RecordValue<'k> {
    key: &'k str,
}

impl<'de> DeserializeSeed<'de> for RecordValue<'_> {
    type Value = Document;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Document, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for RecordValue<'_> {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "record '{}' to be a JSON object", self.key)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Document, A::Error> {
        Document::deserialize(de::value::MapAccessDeserializer::new(map))
    }
}

struct RecordSetVisitor;

impl<'de> Visitor<'de> for RecordSetVisitor {
    type Value = RecordSet;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object mapping document ids to documents")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RecordSet, A::Error> {
        let mut records = Vec::with_capacity(map.size_hint().unwrap_or(0));
        let mut seen = HashSet::new();

        while let Some(key) = map.next_key::<String>()? {
            if let Err(reason) = check_key(&key, &mut seen) {
                return Err(de::Error::custom(format!("record '{}': {}", key, reason)));
            }

            let value = map.next_value_seed(RecordValue { key: &key })?;
            records.push(Record { key, value });
        }

        Ok(RecordSet { records })
    }
}

impl<'de> Deserialize<'de> for RecordSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordSetVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::io::Write;

    #[test]
    fn test_keeps_file_order() {
        let records = RecordSet::from_json_str(
            r#"{"zeta": {"n": 1}, "10": {"n": 2}, "alpha": {"n": 3}, "2": {"n": 4}}"#,
        )
        .unwrap();

        let keys: Vec<&str> = records.keys().collect();
        assert_eq!(keys, vec!["zeta", "10", "alpha", "2"]);
    }

    #[test]
    fn test_values_are_kept_intact() {
        let records =
            RecordSet::from_json_str(r#"{"a": {"amount": 10, "tags": ["x", "y"], "meta": {}}}"#)
                .unwrap();

        assert_eq!(
            Value::Object(records.get("a").unwrap().clone()),
            json!({"amount": 10, "tags": ["x", "y"], "meta": {}})
        );
    }

    #[test]
    fn test_empty_object() {
        let records = RecordSet::from_json_str("{}").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_reject_duplicate_key() {
        let err = RecordSet::from_json_str(r#"{"a": {}, "b": {}, "a": {}}"#).unwrap_err();
        assert!(err.to_string().contains("record 'a': duplicate key"), "{}", err);
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn test_reject_scalar_record() {
        let err = RecordSet::from_json_str("{\n  \"a\": {},\n  \"b\": 42\n}").unwrap_err();
        assert!(
            err.to_string()
                .contains("integer `42`, expected record 'b' to be a JSON object"),
            "{}",
            err
        );
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn test_reject_non_object_reports_value_position() {
        let json = "{\n  \"a\": {\"amount\": 1},\n  \"b\": {\"amount\": 2},\n  \"c\": [1, 2],\n  \"d\": {}\n}";
        let err = RecordSet::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("expected record 'c'"), "{}", err);
        assert_eq!(err.line(), 4);

        let err = RecordSet::from_json_str("{\"a\": null}").unwrap_err();
        assert!(err.to_string().contains("expected record 'a' to be a JSON object"), "{}", err);
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn test_reject_top_level_array() {
        let err = RecordSet::from_json_str(r#"[{"a": 1}]"#).unwrap_err();
        assert!(err.to_string().contains("mapping document ids"));
    }

    #[test]
    fn test_reject_invalid_key() {
        let err = RecordSet::from_json_str(r#"{"a/b": {}}"#).unwrap_err();
        assert!(err.to_string().contains("must not contain '/'"));

        let err = RecordSet::from_json_str(r#"{"": {}}"#).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_from_records_rejects_duplicates() {
        let doc = json!({}).as_object().cloned().unwrap();
        let err = RecordSet::from_records(vec![
            Record::new("a", doc.clone()),
            Record::new("a", doc),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Record { ref key, .. } if key == "a"));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"a": {{"amount": 10}}, "b": {{"amount": 20}}}}"#).unwrap();

        let records = RecordSet::load(file.path()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = RecordSet::load("/nonexistent/transactions.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"a": {{"amount": }}"#).unwrap();

        let err = RecordSet::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
    }
}
