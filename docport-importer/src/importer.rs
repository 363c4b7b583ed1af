//! Sequential bulk import of a record set into one collection.
//!
//! Each record is upserted at `collection/key` and awaited before the next
//! one starts. The first failed write stops the run; documents written
//! before it stay written. Nothing is retried.

use docport_store::{CollectionRef, DocumentStore, DocumentStoreExt, StoreError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::error::{ConfigError, ImportError, Result};
use crate::progress::{ImportProgress, ProgressSink};
use crate::records::RecordSet;

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub collection: String,
    /// Keys written, in write order
    pub written: Vec<String>,
    pub elapsed: Duration,
    /// True when nothing was sent to the store
    pub dry_run: bool,
}

impl ImportReport {
    pub fn count(&self) -> usize {
        self.written.len()
    }
}

pub struct Importer {
    store: Arc<dyn DocumentStore>,
    progress: Arc<dyn ProgressSink>,
}

impl Importer {
    /// Importer writing through `store`, printing `Uploaded: <key>` lines.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            progress: Arc::new(ImportProgress::new(false)),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Upsert every record into `collection`, in order.
    pub async fn run(&self, records: &RecordSet, collection: &str) -> Result<ImportReport> {
        let start = Instant::now();
        let target = self.preflight(records, collection)?;

        info!(
            "Importing {} documents into '{}' ({})",
            records.len(),
            collection,
            self.store.backend_name()
        );
        self.progress.start(records.len());

        let mut written = Vec::with_capacity(records.len());
        for record in records {
            let document = target.document(record.key.as_str()).map_err(config_error)?;

            if let Err(source) = document.set(&record.value).await {
                error!("Failed to write '{}': {}", record.key, source);
                self.progress.failed(&record.key);
                self.progress.finish();
                return Err(ImportError::Write {
                    key: record.key.clone(),
                    written: written.len(),
                    source,
                });
            }

            self.progress.uploaded(&record.key);
            written.push(record.key.clone());
        }

        self.progress.finish();

        let elapsed = start.elapsed();
        info!(
            "Imported {} documents into '{}' in {:.1}s",
            written.len(),
            collection,
            elapsed.as_secs_f64()
        );

        Ok(ImportReport {
            collection: collection.to_string(),
            written,
            elapsed,
            dry_run: false,
        })
    }

    /// Validate everything `run` would write, without writing.
    pub fn plan(&self, records: &RecordSet, collection: &str) -> Result<ImportReport> {
        let start = Instant::now();
        self.preflight(records, collection)?;

        Ok(ImportReport {
            collection: collection.to_string(),
            written: records.keys().map(str::to_string).collect(),
            elapsed: start.elapsed(),
            dry_run: true,
        })
    }

    /// Check the collection path and every document against the store's rules.
    fn preflight(&self, records: &RecordSet, collection: &str) -> Result<CollectionRef<'_>> {
        let target = self.store.collection(collection).map_err(|e| match e {
            StoreError::InvalidPath { reason, .. } => ConfigError::Collection {
                collection: collection.to_string(),
                reason,
            },
            other => ConfigError::Store(other),
        })?;

        for record in records {
            target
                .document(record.key.as_str())
                .and_then(|document| document.check(&record.value))
                .map_err(|e| ConfigError::Record {
                    key: record.key.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(target)
    }
}

fn config_error(e: StoreError) -> ImportError {
    ImportError::Config(ConfigError::Store(e))
}
