//! Document paths.
//!
//! A document is addressed by a collection path and a document id:
//! `collection/id`. Collection paths may be nested under a parent document
//! (`users/alice/transactions`), so they always have an odd number of
//! segments.
//!
//! # Examples
//!
//! ```
//! use docport_store::DocumentPath;
//!
//! let path = DocumentPath::new("transactions", "tx_001").unwrap();
//! assert_eq!(path.to_string(), "transactions/tx_001");
//!
//! assert!(DocumentPath::new("transactions", "a/b").is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, StoreError};

/// Maximum size of a single path segment in bytes.
pub const MAX_SEGMENT_BYTES: usize = 1500;

/// Full path of one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentPath {
    /// Collection path, possibly nested
    pub collection: String,
    /// Document id within the collection
    pub id: String,
}

impl DocumentPath {
    /// Build a validated document path.
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Result<Self> {
        let collection = collection.into();
        let id = id.into();
        validate_collection_path(&collection)?;
        validate_document_id(&id)?;
        Ok(Self { collection, id })
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Check a single path segment against the document-id rules.
pub fn validate_document_id(id: &str) -> Result<()> {
    let reason = if id.is_empty() {
        Some("must not be empty".to_string())
    } else if id.len() > MAX_SEGMENT_BYTES {
        Some(format!("longer than {} bytes", MAX_SEGMENT_BYTES))
    } else if id.contains('/') {
        Some("must not contain '/'".to_string())
    } else if id == "." || id == ".." {
        Some("must not be '.' or '..'".to_string())
    } else if id.len() >= 4 && id.starts_with("__") && id.ends_with("__") {
        Some("ids matching __.*__ are reserved".to_string())
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::InvalidPath {
            path: id.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Check a collection path: one or more valid segments, odd count.
pub fn validate_collection_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
            reason: "collection path must not be empty".to_string(),
        });
    }

    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() % 2 == 0 {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
            reason: "collection path must have an odd number of segments".to_string(),
        });
    }

    for segment in segments {
        validate_document_id(segment).map_err(|e| match e {
            StoreError::InvalidPath { reason, .. } => StoreError::InvalidPath {
                path: path.to_string(),
                reason: format!("segment '{}' {}", segment, reason),
            },
            other => other,
        })?;
    }

    Ok(())
}
