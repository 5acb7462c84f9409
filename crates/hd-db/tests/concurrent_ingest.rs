use hd_core::types::EventId;
use hd_core::{IngestConfig, Ingestor};
use hd_db::{DbStore, schema};
use serde_json::{Value, json};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn event(id: &str) -> Value {
    json!({
        "eventId": id,
        "source": "infra-service",
        "eventType": "SECURITY",
        "occurredAt": "2026-03-02T08:15:00Z",
        "payload": {"action": "token_revoked"}
    })
}

fn ingestor(path: &str, timeout: Duration) -> Ingestor<DbStore> {
    let store = DbStore::open(path, timeout).unwrap();
    Ingestor::new(store, IngestConfig::default())
}

#[test]
fn racing_batches_save_a_shared_id_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ingest.db");
    let path = path.to_str().unwrap().to_string();
    schema::open_and_migrate(&path, schema::DEFAULT_BUSY_TIMEOUT).unwrap();

    for round in 0..20 {
        let shared = format!("shared-{round}");
        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|worker| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                let batch = vec![event(&format!("own-{round}-{worker}")), event(&shared)];
                thread::spawn(move || {
                    let ingestor = ingestor(&path, schema::DEFAULT_BUSY_TIMEOUT);
                    barrier.wait();
                    ingestor.ai_logs().ingest(&batch).unwrap()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let saved: usize = results.iter().map(|r| r.saved).sum();
        let duplicate: usize = results.iter().map(|r| r.duplicate).sum();
        let failed: usize = results.iter().map(|r| r.failed).sum();
        assert_eq!((saved, duplicate, failed), (3, 1, 0), "round {round}");
        assert!(results.iter().all(|r| r.is_consistent()));
    }

    let check = ingestor(&path, schema::DEFAULT_BUSY_TIMEOUT);
    assert_eq!(check.ai_logs().count().unwrap(), 60);
}

#[test]
fn locked_store_fails_items_with_timeout_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ingest.db");
    let path = path.to_str().unwrap().to_string();
    let holder = schema::open_and_migrate(&path, schema::DEFAULT_BUSY_TIMEOUT).unwrap();
    holder.execute_batch("BEGIN IMMEDIATE").unwrap();

    let ingestor = ingestor(&path, Duration::from_millis(50));
    let result = ingestor
        .telemetry()
        .ingest(&[event("a"), event("b")])
        .unwrap();

    assert_eq!((result.received, result.failed), (2, 2));
    assert!(result.failures.iter().all(|f| f.reason == "store timeout"));

    holder.execute_batch("ROLLBACK").unwrap();
    let retried = ingestor
        .telemetry()
        .ingest(&[event("a"), event("b")])
        .unwrap();
    assert_eq!(retried.saved, 2);
    let id = EventId::new("a".to_string()).unwrap();
    assert!(ingestor.telemetry().get(&id).unwrap().is_some());
}
