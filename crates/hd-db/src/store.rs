use crate::event_repo::{EventRepo, table_name};
use crate::schema;
use crate::util::map_sqlite_error;
use hd_core::error::StoreError;
use hd_core::store::Store;
use hd_core::types::EventStream;
use rusqlite::Connection;
use std::time::Duration;

pub struct DbStore {
    conn: Connection,
}

impl DbStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens an already migrated database. The file is never created here.
    pub fn open(path: &str, busy_timeout: Duration) -> Result<Self, StoreError> {
        let conn =
            schema::open_existing(path, busy_timeout).map_err(|err| map_sqlite_error(&err))?;
        Ok(Self::new(conn))
    }

    /// Reads from both event tables, so a database without the schema fails.
    pub fn ping(&self) -> Result<(), StoreError> {
        for stream in [EventStream::AiLog, EventStream::Telemetry] {
            let sql = format!("SELECT 1 FROM {} LIMIT 1", table_name(stream));
            self.conn
                .prepare(&sql)
                .and_then(|mut stmt| stmt.exists([]))
                .map_err(|err| map_sqlite_error(&err))?;
        }
        Ok(())
    }
}

impl Store for DbStore {
    type AiLogs<'a>
        = EventRepo<'a>
    where
        Self: 'a;
    type Telemetry<'a>
        = EventRepo<'a>
    where
        Self: 'a;

    fn ai_logs(&self) -> Self::AiLogs<'_> {
        EventRepo::new(&self.conn, EventStream::AiLog)
    }

    fn telemetry(&self) -> Self::Telemetry<'_> {
        EventRepo::new(&self.conn, EventStream::Telemetry)
    }
}
