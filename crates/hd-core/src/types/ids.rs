use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_EVENT_ID_LEN: usize = 128;

/// Producer-assigned event identifier. Doubles as the idempotency key of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EventId(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    Empty,
    NotAscii { value: String },
    TooLong { len: usize },
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "missing eventId"),
            Self::NotAscii { value } => write!(f, "eventId must be ascii: {value}"),
            Self::TooLong { len } => {
                write!(f, "eventId too long: {len} > {MAX_EVENT_ID_LEN}")
            }
        }
    }
}

impl std::error::Error for IdError {}

impl EventId {
    pub fn new(value: String) -> Result<Self, IdError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        if !trimmed.is_ascii() {
            return Err(IdError::NotAscii {
                value: trimmed.to_string(),
            });
        }
        if trimmed.len() > MAX_EVENT_ID_LEN {
            return Err(IdError::TooLong { len: trimmed.len() });
        }
        if trimmed.len() == value.len() {
            Ok(Self(value))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        EventId::new(value).map_err(serde::de::Error::custom)
    }
}
