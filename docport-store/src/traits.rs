//! Core store trait definitions.
//!
//! The `DocumentStore` trait is the only capability the importer depends on:
//! upsert a document at a path. `CollectionRef` and `DocumentRef` are thin
//! handles over a store that read like the client SDKs
//! (`store.collection("transactions").document("a").set(&doc)`).

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::path::{validate_collection_path, DocumentPath};

/// Content of one document: a JSON object.
pub type Document = Map<String, Value>;

/// Unified trait for document store backends.
///
/// # Write semantics
///
/// `set_document` is an upsert. It creates the document if absent and
/// replaces every field if present. Fields missing from `doc` are removed.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a store can be shared behind an
/// `Arc`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or fully overwrite the document at `path`.
    async fn set_document(&self, path: &DocumentPath, doc: &Document) -> Result<()>;

    /// Read a document back.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the document does not exist.
    async fn get_document(&self, path: &DocumentPath) -> Result<Document>;

    /// Check that `doc` can be written at `path` without sending anything.
    ///
    /// Backends with a stricter document model than JSON override this.
    fn check_document(&self, path: &DocumentPath, doc: &Document) -> Result<()> {
        let _ = (path, doc);
        Ok(())
    }

    /// Human-readable backend name for logs.
    fn backend_name(&self) -> &str;
}

/// Handle to a named collection.
pub struct CollectionRef<'a> {
    store: &'a dyn DocumentStore,
    path: String,
}

impl<'a> CollectionRef<'a> {
    /// Collection path this handle points at.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Handle to the document `id` in this collection.
    pub fn document(&self, id: impl Into<String>) -> Result<DocumentRef<'a>> {
        Ok(DocumentRef {
            store: self.store,
            path: DocumentPath::new(self.path.clone(), id)?,
        })
    }
}

/// Handle to one document.
pub struct DocumentRef<'a> {
    store: &'a dyn DocumentStore,
    path: DocumentPath,
}

impl DocumentRef<'_> {
    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    /// Upsert this document.
    pub async fn set(&self, doc: &Document) -> Result<()> {
        self.store.set_document(&self.path, doc).await
    }

    pub async fn get(&self) -> Result<Document> {
        self.store.get_document(&self.path).await
    }

    /// Validate `doc` against the backend without writing it.
    pub fn check(&self, doc: &Document) -> Result<()> {
        self.store.check_document(&self.path, doc)
    }
}

/// Extension giving every store a `collection()` entry point.
pub trait DocumentStoreExt {
    /// Handle to the collection at `path`.
    fn collection(&self, path: impl Into<String>) -> Result<CollectionRef<'_>>;
}

impl<S: DocumentStore> DocumentStoreExt for S {
    fn collection(&self, path: impl Into<String>) -> Result<CollectionRef<'_>> {
        collection_of(self, path)
    }
}

impl DocumentStoreExt for dyn DocumentStore {
    fn collection(&self, path: impl Into<String>) -> Result<CollectionRef<'_>> {
        collection_of(self, path)
    }
}

fn collection_of(store: &dyn DocumentStore, path: impl Into<String>) -> Result<CollectionRef<'_>> {
    let path = path.into();
    validate_collection_path(&path)?;
    Ok(CollectionRef { store, path })
}
