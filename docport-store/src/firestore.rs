//! Firestore backend over the v1 REST API.
//!
//! # Configuration
//!
//! ```toml
//! [firestore]
//! credentials = "serviceAccountKey.json"
//! database = "(default)"
//! endpoint = "https://firestore.googleapis.com"
//!
//! # Optional: local emulator, no credentials needed
//! emulator_host = "localhost:8080"
//! ```
//!
//! Upserts use `PATCH projects/{p}/databases/{d}/documents/{collection}/{id}`
//! without an update mask, which creates the document or replaces all of its
//! fields.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::credentials::{ServiceAccountKey, ServiceAccountTokenSource, StaticToken, TokenProvider};
use crate::error::{Result, StoreError};
use crate::path::DocumentPath;
use crate::traits::{Document, DocumentStore};
use crate::value::{decode_document, encode_document, Fields};

/// Environment variable the Firebase SDKs read for the emulator address.
pub const EMULATOR_HOST_ENV: &str = "FIRESTORE_EMULATOR_HOST";

/// Configuration for the Firestore backend.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// Google Cloud project id
    pub project_id: String,
    /// Database id, `(default)` unless the project has named databases
    pub database: String,
    /// API root, without the `/v1` suffix
    pub endpoint: String,
    /// Per-request timeout
    pub timeout: Option<Duration>,
}

impl FirestoreConfig {
    /// Configuration for the production service.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: "(default)".to_string(),
            endpoint: "https://firestore.googleapis.com".to_string(),
            timeout: Some(Duration::from_secs(30)),
        }
    }

    /// Configuration for a local emulator at `host` (e.g. `localhost:8080`).
    pub fn emulator(project_id: impl Into<String>, host: &str) -> Self {
        let endpoint = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };
        Self {
            endpoint,
            ..Self::new(project_id)
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct WriteBody<'a> {
    fields: &'a Fields,
}

#[derive(Deserialize)]
struct DocumentBody {
    #[serde(default)]
    fields: Fields,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Firestore document store.
pub struct FirestoreStore {
    client: Client,
    config: FirestoreConfig,
    documents_root: Url,
    tokens: Arc<dyn TokenProvider>,
}

impl FirestoreStore {
    /// Create a store that authenticates through `tokens`.
    pub fn new(config: FirestoreConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let client = build_client(&config)?;
        Self::with_client(client, config, tokens)
    }

    /// Create a store with a prepared HTTP client.
    pub fn with_client(
        client: Client,
        config: FirestoreConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        let documents_root = documents_root(&config)?;
        Ok(Self {
            client,
            config,
            documents_root,
            tokens,
        })
    }

    /// Create a store authenticated with a service-account key.
    ///
    /// `config.project_id` is used as given; callers usually take it from the key.
    pub fn from_service_account(config: FirestoreConfig, key: ServiceAccountKey) -> Result<Self> {
        let client = build_client(&config)?;
        let tokens = ServiceAccountTokenSource::new(client.clone(), key)?;
        Self::with_client(client, config, Arc::new(tokens))
    }

    /// Create a store pointing at a local emulator.
    pub fn emulator(config: FirestoreConfig) -> Result<Self> {
        Self::new(config, Arc::new(StaticToken::emulator()))
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    /// REST URL of a document.
    pub fn document_url(&self, path: &DocumentPath) -> Url {
        let mut url = self.documents_root.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(path.collection.split('/'));
            segments.push(&path.id);
        }
        url
    }

    async fn error_from_response(path: &DocumentPath, response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) if parsed.error.status.is_empty() => parsed.error.message,
            Ok(parsed) => format!("{} ({})", parsed.error.message, parsed.error.status),
            Err(_) => body,
        };
        StoreError::from_status(status, &path.to_string(), message)
    }
}

fn build_client(config: &FirestoreConfig) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

fn documents_root(config: &FirestoreConfig) -> Result<Url> {
    let mut url = Url::parse(config.endpoint.trim_end_matches('/'))
        .map_err(|e| StoreError::Config(format!("invalid endpoint '{}': {}", config.endpoint, e)))?;

    if config.project_id.is_empty() {
        return Err(StoreError::Config("project id must not be empty".to_string()));
    }

    url.path_segments_mut()
        .map_err(|_| StoreError::Config(format!("endpoint '{}' cannot be a base URL", config.endpoint)))?
        .pop_if_empty()
        .extend([
            "v1",
            "projects",
            config.project_id.as_str(),
            "databases",
            config.database.as_str(),
            "documents",
        ]);
    Ok(url)
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    #[instrument(skip(self, doc), fields(path = %path))]
    async fn set_document(&self, path: &DocumentPath, doc: &Document) -> Result<()> {
        let fields = encode_document(path, doc)?;
        let url = self.document_url(path);
        let token = self.tokens.token().await?;

        debug!("PATCH {}", url);
        let response = self
            .client
            .patch(url)
            .bearer_auth(token)
            .json(&WriteBody { fields: &fields })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(path, response).await);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn get_document(&self, path: &DocumentPath) -> Result<Document> {
        let url = self.document_url(path);
        let token = self.tokens.token().await?;

        debug!("GET {}", url);
        let response = self.client.get(url).bearer_auth(token).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(path, response).await);
        }

        let body: DocumentBody = response.json().await?;
        Ok(decode_document(body.fields))
    }

    fn check_document(&self, path: &DocumentPath, doc: &Document) -> Result<()> {
        encode_document(path, doc).map(|_| ())
    }

    fn backend_name(&self) -> &str {
        "firestore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(config: FirestoreConfig) -> FirestoreStore {
        FirestoreStore::new(config, Arc::new(StaticToken("test".to_string()))).unwrap()
    }

    #[test]
    fn test_document_url() {
        let store = store(FirestoreConfig::new("demo-project"));
        let path = DocumentPath::new("transactions", "a").unwrap();
        assert_eq!(
            store.document_url(&path).as_str(),
            "https://firestore.googleapis.com/v1/projects/demo-project/databases/(default)/documents/transactions/a"
        );
    }

    #[test]
    fn test_document_url_nested_and_escaped() {
        let store = store(FirestoreConfig::new("demo-project").with_database("ledger"));
        let path = DocumentPath::new("users/alice/transactions", "tx 1?").unwrap();
        assert_eq!(
            store.document_url(&path).as_str(),
            "https://firestore.googleapis.com/v1/projects/demo-project/databases/ledger/documents/users/alice/transactions/tx%201%3F"
        );
    }

    #[test]
    fn test_emulator_endpoint() {
        let config = FirestoreConfig::emulator("demo-project", "localhost:8080");
        assert_eq!(config.endpoint, "http://localhost:8080");

        let store = store(config);
        let path = DocumentPath::new("transactions", "a").unwrap();
        assert!(store
            .document_url(&path)
            .as_str()
            .starts_with("http://localhost:8080/v1/projects/demo-project/"));
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = FirestoreStore::new(
            FirestoreConfig::new("demo-project").with_endpoint("not a url"),
            Arc::new(StaticToken::emulator()),
        );
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[test]
    fn test_empty_project() {
        let result = FirestoreStore::emulator(FirestoreConfig::emulator("", "localhost:8080"));
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[test]
    fn test_check_document_uses_encoding_rules() {
        let store = store(FirestoreConfig::new("demo-project"));
        let path = DocumentPath::new("transactions", "a").unwrap();
        let doc = serde_json::json!({"grid": [[1]]}).as_object().cloned().unwrap();
        assert!(store.check_document(&path, &doc).unwrap_err().is_validation());
    }
}
