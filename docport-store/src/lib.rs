//! Document store abstraction for docport.
//!
//! This crate provides the `DocumentStore` trait the importer writes through,
//! with a Firestore backend for real runs and an in-memory backend for dry
//! runs and tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │  Importer                                       │
//! │        │                                        │
//! │        ▼                                        │
//! │  store.collection("transactions")               │
//! │       .document("a").set(&doc)                  │
//! │        │                                        │
//! │        ▼                                        │
//! │  ┌─────────────────┐                            │
//! │  │  DocumentStore  │  ← Unified trait           │
//! │  └────────┬────────┘                            │
//! │           │                                     │
//! │     ┌─────┴──────┐                              │
//! │     ▼            ▼                              │
//! │  ┌────────┐ ┌───────────┐    ┌───────────────┐  │
//! │  │ Memory │ │ Firestore │───►│ TokenProvider │  │
//! │  └────────┘ └───────────┘    └───────────────┘  │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use docport_store::{DocumentStoreExt, FirestoreConfig, FirestoreStore, ServiceAccountKey};
//!
//! # async fn example() -> docport_store::Result<()> {
//! let key = ServiceAccountKey::from_file("serviceAccountKey.json")?;
//! let config = FirestoreConfig::new(key.project_id.clone());
//! let store = FirestoreStore::from_service_account(config, key)?;
//!
//! let doc = serde_json::json!({"amount": 10});
//! store
//!     .collection("transactions")?
//!     .document("a")?
//!     .set(doc.as_object().unwrap())
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod credentials;
mod error;
mod firestore;
mod memory;
mod path;
mod traits;
pub mod value;

pub use credentials::{
    ServiceAccountKey, ServiceAccountTokenSource, StaticToken, TokenProvider, DATASTORE_SCOPE,
};
pub use error::{Result, StoreError};
pub use firestore::{FirestoreConfig, FirestoreStore, EMULATOR_HOST_ENV};
pub use memory::MemoryStore;
pub use path::{validate_collection_path, validate_document_id, DocumentPath};
pub use traits::{CollectionRef, Document, DocumentRef, DocumentStore, DocumentStoreExt};
