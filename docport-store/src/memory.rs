//! In-memory document store.
//!
//! Backs dry runs and tests. Documents live in a map keyed by collection path
//! and document id, and are lost when the store is dropped.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, instrument};

use crate::error::{Result, StoreError};
use crate::path::DocumentPath;
use crate::traits::{Document, DocumentStore};

/// In-memory store backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, BTreeMap<String, Document>>>,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All documents in a collection, ordered by id.
    pub fn documents(&self, collection: &str) -> Vec<(String, Document)> {
        self.collections
            .read()
            .get(collection)
            .map(|docs| docs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Total number of successful `set_document` calls.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    #[instrument(skip(self, doc), fields(path = %path))]
    async fn set_document(&self, path: &DocumentPath, doc: &Document) -> Result<()> {
        debug!("Setting document with {} fields", doc.len());
        self.collections
            .write()
            .entry(path.collection.clone())
            .or_default()
            .insert(path.id.clone(), doc.clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn get_document(&self, path: &DocumentPath) -> Result<Document> {
        self.collections
            .read()
            .get(&path.collection)
            .and_then(|docs| docs.get(&path.id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DocumentStoreExt;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();
        let tx = store.collection("transactions").unwrap();

        tx.document("a").unwrap().set(&doc(json!({"amount": 10}))).await.unwrap();

        let read = tx.document("a").unwrap().get().await.unwrap();
        assert_eq!(read, doc(json!({"amount": 10})));
        assert_eq!(store.len("transactions"), 1);
    }

    #[tokio::test]
    async fn test_set_replaces_whole_document() {
        let store = MemoryStore::new();
        let a = store.collection("transactions").unwrap().document("a").unwrap();

        a.set(&doc(json!({"amount": 10, "note": "first"}))).await.unwrap();
        a.set(&doc(json!({"amount": 20}))).await.unwrap();

        assert_eq!(a.get().await.unwrap(), doc(json!({"amount": 20})));
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryStore::new();
        let err = store
            .collection("transactions")
            .unwrap()
            .document("missing")
            .unwrap()
            .get()
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_collections_are_separate() {
        let store = MemoryStore::new();
        let path = DocumentPath::new("transactions", "a").unwrap();
        store.set_document(&path, &doc(json!({}))).await.unwrap();

        assert!(store.is_empty("users"));
        assert_eq!(store.documents("transactions").len(), 1);
    }
}
