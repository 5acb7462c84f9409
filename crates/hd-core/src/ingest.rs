use crate::error::{IngestError, StoreError};
use crate::store::{EventRepository, Store};
use crate::types::{BatchResult, EventId, EventRecord, EventStream, ItemOutcome};
use crate::validation::{event_id_hint, parse_event};
use chrono::{DateTime, Utc};
use serde_json::Value;

pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestConfig {
    pub max_batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

pub type Clock = fn() -> DateTime<Utc>;

pub struct Ingestor<S: Store> {
    store: S,
    config: IngestConfig,
    clock: Clock,
}

impl<S: Store> Ingestor<S> {
    pub fn new(store: S, config: IngestConfig) -> Self {
        Self {
            store,
            config,
            clock: Utc::now,
        }
    }

    /// Overrides the source of `receivedAt`.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn ai_logs(&self) -> StreamApi<'_, S> {
        self.stream(EventStream::AiLog)
    }

    pub fn telemetry(&self) -> StreamApi<'_, S> {
        self.stream(EventStream::Telemetry)
    }

    pub fn stream(&self, stream: EventStream) -> StreamApi<'_, S> {
        StreamApi { core: self, stream }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

pub struct StreamApi<'a, S: Store> {
    core: &'a Ingestor<S>,
    stream: EventStream,
}

impl<S: Store> StreamApi<'_, S> {
    /// Ingests one batch. Items are handled strictly in order and each one is
    /// written in its own store call, so an aborted batch keeps what it saved.
    pub fn ingest(&self, batch: &[Value]) -> Result<BatchResult, IngestError> {
        check_batch_size(&self.core.config, batch.len())?;
        let result = match self.stream {
            EventStream::AiLog => self.ingest_into(&self.core.store.ai_logs(), batch),
            EventStream::Telemetry => self.ingest_into(&self.core.store.telemetry(), batch),
        };
        tracing::info!(
            stream = %self.stream,
            received = result.received,
            saved = result.saved,
            duplicate = result.duplicate,
            failed = result.failed,
            "batch ingested"
        );
        Ok(result)
    }

    pub fn get(&self, event_id: &EventId) -> Result<Option<EventRecord>, IngestError> {
        let record = match self.stream {
            EventStream::AiLog => self.core.store.ai_logs().get(event_id)?,
            EventStream::Telemetry => self.core.store.telemetry().get(event_id)?,
        };
        Ok(record)
    }

    pub fn count(&self) -> Result<u64, IngestError> {
        let count = match self.stream {
            EventStream::AiLog => self.core.store.ai_logs().count()?,
            EventStream::Telemetry => self.core.store.telemetry().count()?,
        };
        Ok(count)
    }

    fn ingest_into<R: EventRepository>(&self, repo: &R, batch: &[Value]) -> BatchResult {
        let mut result = BatchResult::default();
        for item in batch {
            match parse_event(item) {
                Ok(event) => {
                    let record = EventRecord::received(event, (self.core.clock)());
                    let outcome = self.persist(repo, &record);
                    result.record(record.event_id().as_str(), outcome);
                }
                Err(err) => {
                    let event_id = event_id_hint(item);
                    tracing::debug!(stream = %self.stream, event_id = %event_id, reason = %err, "rejected malformed event");
                    result.record(
                        &event_id,
                        ItemOutcome::Failed {
                            reason: err.to_string(),
                        },
                    );
                }
            }
        }
        result
    }

    fn persist<R: EventRepository>(&self, repo: &R, record: &EventRecord) -> ItemOutcome {
        match repo.insert(record) {
            Ok(()) => ItemOutcome::Saved,
            Err(StoreError::DuplicateKey) => {
                tracing::debug!(stream = %self.stream, event_id = %record.event_id(), "duplicate event skipped");
                ItemOutcome::Duplicate
            }
            Err(err) => {
                tracing::warn!(stream = %self.stream, event_id = %record.event_id(), error = %err, "event write failed");
                ItemOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// Reports every item as failed with `reason`, for when no store can be reached.
/// The size limit still applies first.
pub fn reject_all(
    config: &IngestConfig,
    batch: &[Value],
    reason: &str,
) -> Result<BatchResult, IngestError> {
    check_batch_size(config, batch.len())?;
    let mut result = BatchResult::default();
    for item in batch {
        result.record(
            &event_id_hint(item),
            ItemOutcome::Failed {
                reason: reason.to_string(),
            },
        );
    }
    Ok(result)
}

fn check_batch_size(config: &IngestConfig, received: usize) -> Result<(), IngestError> {
    if received > config.max_batch_size {
        return Err(IngestError::BatchTooLarge {
            limit: config.max_batch_size,
            received,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemFailure;
    use chrono::TimeZone;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::{BTreeMap, HashSet};

    #[derive(Default)]
    struct Table {
        rows: RefCell<BTreeMap<String, EventRecord>>,
        writes: RefCell<usize>,
        failing: HashSet<String>,
    }

    impl EventRepository for &Table {
        fn insert(&self, record: &EventRecord) -> Result<(), StoreError> {
            let id = record.event_id().as_str().to_string();
            if self.failing.contains(&id) {
                return Err(StoreError::Timeout);
            }
            let mut rows = self.rows.borrow_mut();
            if rows.contains_key(&id) {
                return Err(StoreError::DuplicateKey);
            }
            rows.insert(id, record.clone());
            *self.writes.borrow_mut() += 1;
            Ok(())
        }

        fn get(&self, event_id: &EventId) -> Result<Option<EventRecord>, StoreError> {
            Ok(self.rows.borrow().get(event_id.as_str()).cloned())
        }

        fn count(&self) -> Result<u64, StoreError> {
            Ok(self.rows.borrow().len() as u64)
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        ai_logs: Table,
        telemetry: Table,
    }

    impl Store for MemoryStore {
        type AiLogs<'a> = &'a Table;
        type Telemetry<'a> = &'a Table;

        fn ai_logs(&self) -> Self::AiLogs<'_> {
            &self.ai_logs
        }

        fn telemetry(&self) -> Self::Telemetry<'_> {
            &self.telemetry
        }
    }

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn ingestor(store: MemoryStore, max_batch_size: usize) -> Ingestor<MemoryStore> {
        Ingestor::new(store, IngestConfig { max_batch_size }).with_clock(fixed_clock)
    }

    fn event(id: &str) -> Value {
        json!({
            "eventId": id,
            "source": "edu-service",
            "eventType": "FEEDBACK",
            "occurredAt": "2026-03-01T11:59:00Z",
            "payload": {"score": 4}
        })
    }

    #[test]
    fn empty_batch_writes_nothing() {
        let ingestor = ingestor(MemoryStore::default(), 10);
        let result = ingestor.ai_logs().ingest(&[]).unwrap();
        assert_eq!(result, BatchResult::default());
        assert_eq!(*ingestor.store().ai_logs.writes.borrow(), 0);
    }

    #[test]
    fn missing_event_id_fails_only_that_item() {
        let ingestor = ingestor(MemoryStore::default(), 10);
        let mut broken = event("ignored");
        broken.as_object_mut().unwrap().remove("eventId");
        let batch = vec![event("a"), broken, event("b")];

        let result = ingestor.ai_logs().ingest(&batch).unwrap();

        assert_eq!((result.received, result.saved, result.failed), (3, 2, 1));
        assert_eq!(
            result.failures,
            vec![ItemFailure {
                event_id: String::new(),
                reason: "missing eventId".to_string(),
            }]
        );
        assert!(result.is_consistent());
    }

    #[test]
    fn resubmitting_a_batch_only_reports_duplicates() {
        let ingestor = ingestor(MemoryStore::default(), 10);
        let batch = vec![event("a"), event("b"), event("c")];

        let first = ingestor.telemetry().ingest(&batch).unwrap();
        let second = ingestor.telemetry().ingest(&batch).unwrap();

        assert_eq!(first.saved, 3);
        assert_eq!((second.saved, second.duplicate, second.failed), (0, 3, 0));
        assert_eq!(*ingestor.store().telemetry.writes.borrow(), 3);
    }

    #[test]
    fn repeated_id_within_one_batch_is_a_duplicate() {
        let ingestor = ingestor(MemoryStore::default(), 10);
        let result = ingestor
            .ai_logs()
            .ingest(&[event("a"), event("a")])
            .unwrap();
        assert_eq!((result.saved, result.duplicate), (1, 1));
    }

    #[test]
    fn store_failure_does_not_stop_the_batch() {
        let store = MemoryStore {
            ai_logs: Table {
                failing: HashSet::from(["b".to_string()]),
                ..Table::default()
            },
            ..MemoryStore::default()
        };
        let ingestor = ingestor(store, 10);
        let batch = vec![event("a"), event("b"), json!(7), event("c")];

        let result = ingestor.ai_logs().ingest(&batch).unwrap();

        assert_eq!((result.saved, result.failed), (2, 2));
        let reasons: Vec<_> = result
            .failures
            .iter()
            .map(|f| (f.event_id.as_str(), f.reason.as_str()))
            .collect();
        assert_eq!(
            reasons,
            vec![("b", "store timeout"), ("", "event must be a json object")]
        );
    }

    #[test]
    fn oversized_batch_is_rejected_before_any_write() {
        let ingestor = ingestor(MemoryStore::default(), 2);
        let batch = vec![event("a"), event("b"), event("c")];

        let err = ingestor.ai_logs().ingest(&batch).unwrap_err();

        assert!(matches!(
            err,
            IngestError::BatchTooLarge {
                limit: 2,
                received: 3
            }
        ));
        assert_eq!(*ingestor.store().ai_logs.writes.borrow(), 0);
    }

    #[test]
    fn received_at_comes_from_the_ingestor_clock() {
        let ingestor = ingestor(MemoryStore::default(), 10);
        let mut item = event("a");
        item["receivedAt"] = json!("1999-01-01T00:00:00Z");

        ingestor.ai_logs().ingest(&[item]).unwrap();

        let id = EventId::new("a".to_string()).unwrap();
        let stored = ingestor.ai_logs().get(&id).unwrap().unwrap();
        assert_eq!(stored.received_at, fixed_clock());
        assert_eq!(stored.event.payload, json!({"score": 4}));
    }

    #[test]
    fn streams_have_separate_key_spaces() {
        let ingestor = ingestor(MemoryStore::default(), 10);
        assert_eq!(ingestor.ai_logs().ingest(&[event("a")]).unwrap().saved, 1);
        assert_eq!(ingestor.telemetry().ingest(&[event("a")]).unwrap().saved, 1);
        assert_eq!(ingestor.ai_logs().count().unwrap(), 1);
        assert_eq!(ingestor.telemetry().count().unwrap(), 1);
    }

    #[test]
    fn reject_all_keeps_order_and_size_limit() {
        let config = IngestConfig { max_batch_size: 3 };
        let batch = vec![event("a"), json!({}), event("c")];

        let result = reject_all(&config, &batch, "store unavailable: disk gone").unwrap();

        assert_eq!((result.received, result.failed), (3, 3));
        let ids: Vec<_> = result.failures.iter().map(|f| f.event_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "", "c"]);

        let too_many = vec![event("a"); 4];
        assert!(reject_all(&config, &too_many, "x").is_err());
    }
}
