pub mod batch;
pub mod enums;
pub mod event;
pub mod ids;

pub use batch::{BatchResult, ItemFailure, ItemOutcome};
pub use enums::{EventStream, EventType};
pub use event::{EventRecord, IngestEvent};
pub use ids::{EventId, IdError};
