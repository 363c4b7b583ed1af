//! docport-importer: upload a keyed JSON file into a Firestore collection
//!
//! ```text
//! transactions.json            Firestore
//! {"a": {...},        ──►     transactions/a
//!  "b": {...}}                transactions/b
//! ```
//!
//! Records are written one at a time in file order. The first failed write
//! stops the run.

pub mod config;
pub mod error;
pub mod importer;
pub mod progress;
pub mod records;

pub use config::Config;
pub use error::{ConfigError, ImportError, Result};
pub use importer::{ImportReport, Importer};
pub use progress::{ImportProgress, ProgressSink, RecordingProgress};
pub use records::{Record, RecordSet};

use config::FirestoreSettings;
use docport_store::{DocumentStore, FirestoreConfig, FirestoreStore, ServiceAccountKey, StoreError};
use std::sync::Arc;

/// Project id used against an emulator when neither the config nor a key file names one.
pub const EMULATOR_PROJECT_ID: &str = "demo-docport";

/// Create the Firestore store described by `settings`.
///
/// With `emulator_host` set, the key file is optional and only consulted for
/// the project id.
pub fn open_store(settings: &FirestoreSettings) -> std::result::Result<Arc<dyn DocumentStore>, ConfigError> {
    if let Some(host) = &settings.emulator_host {
        let project_id = match &settings.project_id {
            Some(id) => id.clone(),
            None => ServiceAccountKey::from_file(&settings.credentials)
                .map(|key| key.project_id)
                .unwrap_or_else(|_| EMULATOR_PROJECT_ID.to_string()),
        };
        tracing::info!("Using Firestore emulator at {} (project {})", host, project_id);

        let config = FirestoreConfig::emulator(project_id, host)
            .with_database(settings.database.clone())
            .with_timeout(settings.timeout());
        return Ok(Arc::new(FirestoreStore::emulator(config)?));
    }

    let key = ServiceAccountKey::from_file(&settings.credentials).map_err(credentials_error)?;
    let project_id = settings
        .project_id
        .clone()
        .unwrap_or_else(|| key.project_id.clone());
    tracing::info!(
        "Using Firestore project {} as {}",
        project_id,
        key.client_email
    );

    let config = FirestoreConfig::new(project_id)
        .with_database(settings.database.clone())
        .with_endpoint(settings.endpoint.clone())
        .with_timeout(settings.timeout());
    let store = FirestoreStore::from_service_account(config, key).map_err(credentials_error)?;
    Ok(Arc::new(store))
}

fn credentials_error(e: StoreError) -> ConfigError {
    match e {
        StoreError::Credentials(reason) => ConfigError::Credentials(reason),
        other => ConfigError::Store(other),
    }
}
