use crate::util::{
    decode_enum, decode_json, encode_enum, encode_json, from_rfc3339, map_sqlite_error, to_rfc3339,
};
use hd_core::error::StoreError;
use hd_core::store::EventRepository;
use hd_core::types::{EventId, EventRecord, EventStream, IngestEvent};
use rusqlite::{Connection, OptionalExtension};

const COLUMNS: &str = "event_id, source, event_type, occurred_at, sent_at, received_at, trace_id, conversation_id, turn_id, user_id, dept_id, payload_json";

pub fn table_name(stream: EventStream) -> &'static str {
    match stream {
        EventStream::AiLog => "ai_logs",
        EventStream::Telemetry => "telemetry_events",
    }
}

pub struct EventRepo<'a> {
    pub conn: &'a Connection,
    pub stream: EventStream,
}

impl<'a> EventRepo<'a> {
    pub fn new(conn: &'a Connection, stream: EventStream) -> Self {
        Self { conn, stream }
    }
}

impl EventRepository for EventRepo<'_> {
    // Plain INSERT in autocommit mode: the primary key is the only arbiter
    // between racing batches, and a saved row is durable on return.
    fn insert(&self, record: &EventRecord) -> Result<(), StoreError> {
        let event = &record.event;
        let sql = format!(
            "INSERT INTO {} ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            table_name(self.stream)
        );
        let params = (
            event.event_id.as_str(),
            event.source.as_str(),
            encode_enum(&event.event_type)?,
            to_rfc3339(&event.occurred_at),
            event.sent_at.as_ref().map(to_rfc3339),
            to_rfc3339(&record.received_at),
            event.trace_id.as_deref(),
            event.conversation_id.as_deref(),
            event.turn_id.as_deref(),
            event.user_id.as_deref(),
            event.dept_id.as_deref(),
            encode_json(&event.payload)?,
        );
        self.conn
            .execute(&sql, params)
            .map_err(|err| map_sqlite_error(&err))?;
        Ok(())
    }

    fn get(&self, event_id: &EventId) -> Result<Option<EventRecord>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {} WHERE event_id = ?1",
            table_name(self.stream)
        );
        let row = self
            .conn
            .query_row(&sql, [event_id.as_str()], read_row)
            .optional()
            .map_err(|err| map_sqlite_error(&err))?;
        row.map(map_event_row).transpose()
    }

    fn count(&self) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table_name(self.stream));
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|err| map_sqlite_error(&err))?;
        u64::try_from(count).map_err(|err| StoreError::Corrupt {
            message: err.to_string(),
        })
    }
}

struct EventRow {
    event_id: String,
    source: String,
    event_type: String,
    occurred_at: String,
    sent_at: Option<String>,
    received_at: String,
    trace_id: Option<String>,
    conversation_id: Option<String>,
    turn_id: Option<String>,
    user_id: Option<String>,
    dept_id: Option<String>,
    payload_json: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        event_id: row.get(0)?,
        source: row.get(1)?,
        event_type: row.get(2)?,
        occurred_at: row.get(3)?,
        sent_at: row.get(4)?,
        received_at: row.get(5)?,
        trace_id: row.get(6)?,
        conversation_id: row.get(7)?,
        turn_id: row.get(8)?,
        user_id: row.get(9)?,
        dept_id: row.get(10)?,
        payload_json: row.get(11)?,
    })
}

fn map_event_row(row: EventRow) -> Result<EventRecord, StoreError> {
    let event_id = EventId::new(row.event_id).map_err(|err| StoreError::Corrupt {
        message: err.to_string(),
    })?;
    let sent_at = row.sent_at.as_deref().map(from_rfc3339).transpose()?;
    Ok(EventRecord {
        event: IngestEvent {
            event_id,
            source: row.source,
            event_type: decode_enum(&row.event_type)?,
            occurred_at: from_rfc3339(&row.occurred_at)?,
            sent_at,
            trace_id: row.trace_id,
            conversation_id: row.conversation_id,
            turn_id: row.turn_id,
            user_id: row.user_id,
            dept_id: row.dept_id,
            payload: decode_json(&row.payload_json)?,
        },
        received_at: from_rfc3339(&row.received_at)?,
    })
}
