use async_trait::async_trait;
use docport_importer::{ConfigError, ImportError, Importer, Record, RecordSet, RecordingProgress};
use docport_store::{
    Document, DocumentPath, DocumentStore, MemoryStore, Result as StoreResult, StoreError,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Wraps a `MemoryStore` and rejects writes to one document id.
struct RejectingStore {
    inner: Arc<MemoryStore>,
    reject: String,
}

#[async_trait]
impl DocumentStore for RejectingStore {
    async fn set_document(&self, path: &DocumentPath, doc: &Document) -> StoreResult<()> {
        if path.id == self.reject {
            return Err(StoreError::PermissionDenied(path.to_string()));
        }
        self.inner.set_document(path, doc).await
    }

    async fn get_document(&self, path: &DocumentPath) -> StoreResult<Document> {
        self.inner.get_document(path).await
    }

    fn backend_name(&self) -> &str {
        "rejecting"
    }
}

fn scenario_records() -> RecordSet {
    RecordSet::from_json_str(r#"{"a": {"amount": 10}, "b": {"amount": 20}}"#).unwrap()
}

fn importer(store: Arc<dyn DocumentStore>, progress: &Arc<RecordingProgress>) -> Importer {
    Importer::new(store).with_progress(progress.clone())
}

fn as_json(doc: &Document) -> Value {
    Value::Object(doc.clone())
}

#[tokio::test]
async fn test_uploads_every_record_in_order() {
    let store = Arc::new(MemoryStore::new());
    let progress = Arc::new(RecordingProgress::new());

    let report = importer(store.clone(), &progress)
        .run(&scenario_records(), "transactions")
        .await
        .unwrap();

    assert_eq!(report.written, vec!["a", "b"]);
    assert!(!report.dry_run);
    assert_eq!(progress.lines(), vec!["Uploaded: a", "Uploaded: b"]);

    let docs = store.documents("transactions");
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].0, "a");
    assert_eq!(as_json(&docs[0].1), json!({"amount": 10}));
    assert_eq!(docs[1].0, "b");
    assert_eq!(as_json(&docs[1].1), json!({"amount": 20}));
}

#[tokio::test]
async fn test_empty_record_set() {
    let store = Arc::new(MemoryStore::new());
    let progress = Arc::new(RecordingProgress::new());

    let report = importer(store.clone(), &progress)
        .run(&RecordSet::new(), "transactions")
        .await
        .unwrap();

    assert_eq!(report.count(), 0);
    assert!(progress.lines().is_empty());
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_failure_stops_the_run() {
    let memory = Arc::new(MemoryStore::new());
    let store = Arc::new(RejectingStore {
        inner: memory.clone(),
        reject: "b".to_string(),
    });
    let progress = Arc::new(RecordingProgress::new());

    let err = importer(store, &progress)
        .run(&scenario_records(), "transactions")
        .await
        .unwrap_err();

    match &err {
        ImportError::Write {
            key,
            written,
            source,
        } => {
            assert_eq!(key, "b");
            assert_eq!(*written, 1);
            assert!(source.is_permission_denied());
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(err.failed_key(), Some("b"));

    assert_eq!(progress.lines(), vec!["Uploaded: a"]);
    assert_eq!(progress.failures(), vec!["b"]);

    let docs = memory.documents("transactions");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].0, "a");
}

#[tokio::test]
async fn test_records_after_failure_are_not_attempted() {
    let memory = Arc::new(MemoryStore::new());
    let store = Arc::new(RejectingStore {
        inner: memory.clone(),
        reject: "second".to_string(),
    });
    let progress = Arc::new(RecordingProgress::new());
    let records =
        RecordSet::from_json_str(r#"{"first": {}, "second": {}, "third": {}, "fourth": {}}"#)
            .unwrap();

    importer(store, &progress)
        .run(&records, "transactions")
        .await
        .unwrap_err();

    assert_eq!(memory.write_count(), 1);
    assert_eq!(progress.lines(), vec!["Uploaded: first"]);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let records = scenario_records();
    let progress = Arc::new(RecordingProgress::new());
    let importer = importer(store.clone(), &progress);

    importer.run(&records, "transactions").await.unwrap();
    let first = store.documents("transactions");

    importer.run(&records, "transactions").await.unwrap();
    assert_eq!(store.documents("transactions"), first);
}

#[tokio::test]
async fn test_overwrites_existing_documents() {
    let store = Arc::new(MemoryStore::new());
    let stale = DocumentPath::new("transactions", "a").unwrap();
    store
        .set_document(
            &stale,
            json!({"amount": 1, "note": "stale"}).as_object().unwrap(),
        )
        .await
        .unwrap();

    let progress = Arc::new(RecordingProgress::new());
    importer(store.clone(), &progress)
        .run(&scenario_records(), "transactions")
        .await
        .unwrap();

    let a = store.get_document(&stale).await.unwrap();
    assert_eq!(as_json(&a), json!({"amount": 10}));
}

#[tokio::test]
async fn test_invalid_collection_is_a_config_error() {
    let store = Arc::new(MemoryStore::new());
    let progress = Arc::new(RecordingProgress::new());

    let err = importer(store.clone(), &progress)
        .run(&scenario_records(), "users/alice")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ImportError::Config(ConfigError::Collection { .. })
    ));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_nested_collection() {
    let store = Arc::new(MemoryStore::new());
    let progress = Arc::new(RecordingProgress::new());

    importer(store.clone(), &progress)
        .run(&scenario_records(), "users/alice/transactions")
        .await
        .unwrap();

    assert_eq!(store.len("users/alice/transactions"), 2);
}

#[tokio::test]
async fn test_plan_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let progress = Arc::new(RecordingProgress::new());

    let plan = importer(store.clone(), &progress)
        .plan(&scenario_records(), "transactions")
        .unwrap();

    assert!(plan.dry_run);
    assert_eq!(plan.written, vec!["a", "b"]);
    assert_eq!(store.write_count(), 0);
    assert!(progress.lines().is_empty());
}

#[tokio::test]
async fn test_records_built_in_memory() {
    let store = Arc::new(MemoryStore::new());
    let progress = Arc::new(RecordingProgress::new());
    let records = RecordSet::from_records(vec![
        Record::new("z", json!({"n": 1}).as_object().cloned().unwrap()),
        Record::new("y", json!({"n": 2}).as_object().cloned().unwrap()),
    ])
    .unwrap();

    importer(store, &progress)
        .run(&records, "transactions")
        .await
        .unwrap();

    assert_eq!(progress.lines(), vec!["Uploaded: z", "Uploaded: y"]);
}
