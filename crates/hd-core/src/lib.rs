pub mod error;
pub mod ingest;
pub mod store;
pub mod validation;

pub mod types;

pub use crate::error::{IngestError, ShapeError, StoreError};
pub use crate::ingest::{IngestConfig, Ingestor, reject_all};
pub use crate::store::{EventRepository, Store};
