use crate::types::ids::IdError;
use thiserror::Error;

/// Why a single batch item was rejected before reaching the store.
/// The `Display` text is what callers see as the failure reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("event must be a json object")]
    NotAnObject,
    #[error("eventId must be a string")]
    EventIdNotString,
    #[error("{0}")]
    EventId(#[from] IdError),
    #[error("missing {field}")]
    MissingField { field: &'static str },
    #[error("{field} must be a string")]
    NotAString { field: &'static str },
    #[error("invalid eventType: {value}")]
    InvalidEventType { value: String },
    #[error("invalid {field}: {value}")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("source too long: {len} > {max}")]
    SourceTooLong { len: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("duplicate eventId")]
    DuplicateKey,
    #[error("store timeout")]
    Timeout,
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
    #[error("stored record unreadable: {message}")]
    Corrupt { message: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("batch too large: {received} events exceeds limit of {limit}")]
    BatchTooLarge { limit: usize, received: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}
