use crate::error::StoreError;
use crate::types::{EventId, EventRecord};

/// Durable store with unique-key insert. `insert` must report an existing
/// `event_id` as `StoreError::DuplicateKey` and enforce that atomically,
/// since concurrent batches race on the same key.
pub trait EventRepository {
    fn insert(&self, record: &EventRecord) -> Result<(), StoreError>;
    fn get(&self, event_id: &EventId) -> Result<Option<EventRecord>, StoreError>;
    fn count(&self) -> Result<u64, StoreError>;
}

pub trait Store {
    type AiLogs<'a>: EventRepository
    where
        Self: 'a;
    type Telemetry<'a>: EventRepository
    where
        Self: 'a;

    fn ai_logs(&self) -> Self::AiLogs<'_>;
    fn telemetry(&self) -> Self::Telemetry<'_>;
}
