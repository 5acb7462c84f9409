use crate::types::enums::EventType;
use crate::types::ids::EventId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A validated inbound event. `payload` is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestEvent {
    pub event_id: EventId,
    pub source: String,
    pub event_type: EventType,
    pub occurred_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub trace_id: Option<String>,
    pub conversation_id: Option<String>,
    pub turn_id: Option<String>,
    pub user_id: Option<String>,
    pub dept_id: Option<String>,
    pub payload: Value,
}

/// Persisted form of an event. Never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(flatten)]
    pub event: IngestEvent,
    pub received_at: DateTime<Utc>,
}

impl EventRecord {
    pub fn received(event: IngestEvent, received_at: DateTime<Utc>) -> Self {
        Self { event, received_at }
    }

    pub fn event_id(&self) -> &EventId {
        &self.event.event_id
    }
}
