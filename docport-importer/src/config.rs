//! Importer configuration.
//!
//! Default config location: `./docport.toml` (optional). Every value can be
//! overridden from the command line.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Main configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub firestore: FirestoreSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportConfig {
    /// JSON file holding the records
    #[serde(default = "default_input")]
    pub input: PathBuf,
    /// Target collection path
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Validate and list keys without writing
    #[serde(default)]
    pub dry_run: bool,
    /// Draw a progress bar on stderr
    #[serde(default)]
    pub progress_bar: bool,
}

fn default_input() -> PathBuf {
    PathBuf::from("transactions.json")
}

fn default_collection() -> String {
    "transactions".to_string()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            collection: default_collection(),
            dry_run: false,
            progress_bar: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FirestoreSettings {
    /// Service-account key file
    #[serde(default = "default_credentials")]
    pub credentials: PathBuf,
    /// Overrides the project id from the key file
    pub project_id: Option<String>,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// `host:port` of a Firestore emulator; credentials are not used when set
    pub emulator_host: Option<String>,
    /// Per-request timeout in seconds (0 disables it)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_credentials() -> PathBuf {
    PathBuf::from("serviceAccountKey.json")
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_endpoint() -> String {
    "https://firestore.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for FirestoreSettings {
    fn default() -> Self {
        Self {
            credentials: default_credentials(),
            project_id: None,
            database: default_database(),
            endpoint: default_endpoint(),
            emulator_host: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FirestoreSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &Path) -> Result<PathBuf, ConfigError> {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| ConfigError::Other("Cannot determine home directory".to_string()))?;
        Ok(home.join(rest))
    } else if s == "~" {
        dirs::home_dir()
            .ok_or_else(|| ConfigError::Other("Cannot determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

impl Config {
    /// Load from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.expand_paths()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from(path)
        } else {
            let mut config = Config::default();
            config.expand_paths()?;
            Ok(config)
        }
    }

    pub fn expand_paths(&mut self) -> Result<(), ConfigError> {
        self.import.input = expand_tilde(&self.import.input)?;
        self.firestore.credentials = expand_tilde(&self.firestore.credentials)?;
        Ok(())
    }
}
