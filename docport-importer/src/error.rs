use docport_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Problems found before the first write: bad input, credentials or settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config file {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid record '{key}': {reason}")]
    Record { key: String, reason: String },

    #[error("Invalid collection '{collection}': {reason}")]
    Collection { collection: String, reason: String },

    #[error("Credentials: {0}")]
    Credentials(String),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The store rejected or failed an upsert; `written` documents went through before it.
    #[error("Write failed for '{key}' after {written} documents: {source}")]
    Write {
        key: String,
        written: usize,
        #[source]
        source: StoreError,
    },
}

impl ImportError {
    /// Key being written when the run stopped, if any.
    pub fn failed_key(&self) -> Option<&str> {
        match self {
            ImportError::Write { key, .. } => Some(key),
            ImportError::Config(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
