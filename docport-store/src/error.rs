//! Store error types.

use thiserror::Error;

/// Document store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level failure talking to the remote store
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status
    #[error("Store returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Document does not exist
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Caller is not allowed to write the document
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Collection path or document id rejected by the store's naming rules
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Document content cannot be represented in the store's document model
    #[error("Invalid document at '{path}': {reason}")]
    InvalidDocument { path: String, reason: String },

    /// Service-account credential could not be loaded or exchanged
    #[error("Credential error: {0}")]
    Credentials(String),

    /// JWT signing failed
    #[error("Token signing failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Store configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Map an HTTP status and response body to a store error.
    pub fn from_status(status: u16, path: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => StoreError::PermissionDenied(format!("{}: {}", path, message)),
            404 => StoreError::NotFound(path.to_string()),
            _ => StoreError::Status { status, message },
        }
    }

    /// Check if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Check if this is a permission error.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::PermissionDenied(_))
    }

    /// Errors raised before any request leaves the process.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidPath { .. } | StoreError::InvalidDocument { .. }
        )
    }
}
