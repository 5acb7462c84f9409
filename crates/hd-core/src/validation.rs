use crate::error::ShapeError;
use crate::types::ids::IdError;
use crate::types::{EventId, EventType, IngestEvent};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub const MAX_SOURCE_LEN: usize = 64;

/// Identifier used in a failure entry. Empty when the item carries no string `eventId`.
pub fn event_id_hint(value: &Value) -> String {
    value
        .get("eventId")
        .and_then(Value::as_str)
        .map(|id| id.trim().to_string())
        .unwrap_or_default()
}

/// Checks one raw batch item against the field rules. A caller-supplied
/// `receivedAt` is dropped here, unknown fields are ignored.
pub fn parse_event(value: &Value) -> Result<IngestEvent, ShapeError> {
    let Value::Object(map) = value else {
        return Err(ShapeError::NotAnObject);
    };

    let event_id = match map.get("eventId") {
        None | Some(Value::Null) => return Err(ShapeError::EventId(IdError::Empty)),
        Some(Value::String(raw)) => EventId::new(raw.clone())?,
        Some(_) => return Err(ShapeError::EventIdNotString),
    };

    let raw_type = required_str(map, "eventType")?;
    let event_type =
        EventType::parse(raw_type.trim()).ok_or_else(|| ShapeError::InvalidEventType {
            value: raw_type.to_string(),
        })?;

    let source = required_str(map, "source")?.trim().to_string();
    if source.is_empty() {
        return Err(ShapeError::MissingField { field: "source" });
    }
    let source_len = source.chars().count();
    if source_len > MAX_SOURCE_LEN {
        return Err(ShapeError::SourceTooLong {
            len: source_len,
            max: MAX_SOURCE_LEN,
        });
    }

    let occurred_at = parse_timestamp("occurredAt", required_str(map, "occurredAt")?)?;
    let sent_at = match optional_str(map, "sentAt")? {
        Some(raw) => Some(parse_timestamp("sentAt", &raw)?),
        None => None,
    };

    Ok(IngestEvent {
        event_id,
        source,
        event_type,
        occurred_at,
        sent_at,
        trace_id: optional_str(map, "traceId")?,
        conversation_id: optional_str(map, "conversationId")?,
        turn_id: optional_str(map, "turnId")?,
        user_id: optional_str(map, "userId")?,
        dept_id: optional_str(map, "deptId")?,
        payload: map.get("payload").cloned().unwrap_or(Value::Null),
    })
}

fn required_str<'a>(map: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, ShapeError> {
    match map.get(field) {
        None | Some(Value::Null) => Err(ShapeError::MissingField { field }),
        Some(Value::String(value)) => Ok(value.as_str()),
        Some(_) => Err(ShapeError::NotAString { field }),
    }
}

fn optional_str(map: &Map<String, Value>, field: &'static str) -> Result<Option<String>, ShapeError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) if value.trim().is_empty() => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(ShapeError::NotAString { field }),
    }
}

fn parse_timestamp(field: &'static str, raw: &str) -> Result<DateTime<Utc>, ShapeError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ShapeError::InvalidTimestamp {
            field,
            value: raw.to_string(),
        })
}
