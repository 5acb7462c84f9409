use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Saved,
    Duplicate,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub event_id: String,
    pub reason: String,
}

/// Per-batch summary. `received == saved + duplicate + failed` always holds,
/// and `failures` lists failing items in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub received: usize,
    pub saved: usize,
    pub duplicate: usize,
    pub failed: usize,
    pub failures: Vec<ItemFailure>,
}

impl BatchResult {
    pub fn record(&mut self, event_id: &str, outcome: ItemOutcome) {
        self.received += 1;
        match outcome {
            ItemOutcome::Saved => self.saved += 1,
            ItemOutcome::Duplicate => self.duplicate += 1,
            ItemOutcome::Failed { reason } => {
                self.failed += 1;
                self.failures.push(ItemFailure {
                    event_id: event_id.to_string(),
                    reason,
                });
            }
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.received == self.saved + self.duplicate + self.failed
            && self.failures.len() == self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_counts_balanced() {
        let mut result = BatchResult::default();
        result.record("a", ItemOutcome::Saved);
        result.record("b", ItemOutcome::Duplicate);
        result.record(
            "",
            ItemOutcome::Failed {
                reason: "missing eventId".to_string(),
            },
        );
        assert_eq!(result.received, 3);
        assert_eq!((result.saved, result.duplicate, result.failed), (1, 1, 1));
        assert!(result.is_consistent());
        assert_eq!(result.failures[0].event_id, "");
    }

    #[test]
    fn serializes_camel_case_failures() {
        let mut result = BatchResult::default();
        result.record(
            "evt-9",
            ItemOutcome::Failed {
                reason: "store timeout".to_string(),
            },
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["failures"][0]["eventId"], "evt-9");
        assert_eq!(json["failures"][0]["reason"], "store timeout");
        assert_eq!(json["duplicate"], 0);
    }
}
