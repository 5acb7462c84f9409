use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of event categories accepted on either stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    ChatTurn,
    Feedback,
    Security,
    RagRetrieval,
    InferenceError,
    Usage,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::ChatTurn,
        EventType::Feedback,
        EventType::Security,
        EventType::RagRetrieval,
        EventType::InferenceError,
        EventType::Usage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChatTurn => "CHAT_TURN",
            Self::Feedback => "FEEDBACK",
            Self::Security => "SECURITY",
            Self::RagRetrieval => "RAG_RETRIEVAL",
            Self::InferenceError => "INFERENCE_ERROR",
            Self::Usage => "USAGE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Independent idempotency key spaces. Each stream lands in its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStream {
    AiLog,
    Telemetry,
}

impl EventStream {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AiLog => "ai_log",
            Self::Telemetry => "telemetry",
        }
    }
}

impl fmt::Display for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_wire_names_match_serde() {
        for kind in EventType::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.as_str().to_string()));
            assert_eq!(EventType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EventType::parse("chat_turn"), None);
    }
}
