//! Service-account credentials and OAuth2 access tokens.
//!
//! A Google service-account key file is exchanged for a short-lived access
//! token using the JWT bearer grant:
//!
//! 1. Sign an RS256 JWT with the key's private key (`iss` = client email,
//!    `aud` = token URI, `scope` = datastore).
//! 2. POST it to the token URI as `assertion`.
//! 3. Cache the returned token until shortly before it expires.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Result, StoreError};

/// OAuth2 scope granting Firestore access.
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
// Refresh this long before the server-side expiry.
const REFRESH_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Contents of a service-account key file.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl ServiceAccountKey {
    /// Load and validate a key file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
            .map_err(|e| StoreError::Credentials(format!("{}: {}", path.display(), e)))
    }

    /// Parse and validate key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(json)
            .map_err(|e| StoreError::Credentials(format!("invalid key file: {}", e)))?;

        if key.key_type != "service_account" {
            return Err(StoreError::Credentials(format!(
                "expected type 'service_account', found '{}'",
                key.key_type
            )));
        }
        if key.project_id.is_empty() || key.client_email.is_empty() {
            return Err(StoreError::Credentials(
                "project_id and client_email must be set".to_string(),
            ));
        }
        Ok(key)
    }
}

/// Source of bearer tokens for store requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A currently valid access token.
    async fn token(&self) -> Result<String>;
}

/// Fixed token. The Firestore emulator accepts `owner` for full access.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl StaticToken {
    pub fn emulator() -> Self {
        Self("owner".to_string())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    TOKEN_LIFETIME_SECS
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Exchanges a service-account key for access tokens.
pub struct ServiceAccountTokenSource {
    client: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    /// Create a token source. Fails if the private key is not a valid RSA PEM.
    pub fn new(client: Client, key: ServiceAccountKey) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| StoreError::Credentials(format!("invalid private key: {}", e)))?;
        Ok(Self {
            client,
            key,
            encoding_key,
            cached: Mutex::new(None),
        })
    }

    pub fn key(&self) -> &ServiceAccountKey {
        &self.key
    }

    /// Build the signed JWT assertion for the token exchange.
    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        if !self.key.private_key_id.is_empty() {
            header.kid = Some(self.key.private_key_id.clone());
        }

        let claims = Claims {
            iss: &self.key.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + TOKEN_LIFETIME_SECS,
        };

        Ok(encode(&header, &claims, &self.encoding_key)?)
    }

    async fn fetch(&self) -> Result<CachedToken> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;

        debug!("Requesting access token from {}", self.key.token_uri);
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Credentials(format!(
                "token exchange failed ({}): {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        info!(
            "Authenticated as {} (token valid {}s)",
            self.key.client_email, token.expires_in
        );

        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenSource {
    async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(current) = cached.as_ref() {
            if current.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > Utc::now() {
                return Ok(current.token.clone());
            }
        }

        let fresh = self.fetch().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}
