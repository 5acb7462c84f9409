use rusqlite::{Connection, OpenFlags, Result};
use std::time::Duration;

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Opens a WAL-mode connection. `busy_timeout` bounds how long any single
/// statement waits on a competing writer before failing.
pub fn open(path: &str, busy_timeout: Duration) -> Result<Connection> {
    configure(Connection::open(path)?, busy_timeout)
}

/// Like [`open`], but never creates the file. A database that went missing
/// after startup is an error here instead of a fresh schemaless one.
pub fn open_existing(path: &str, busy_timeout: Duration) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    configure(Connection::open_with_flags(path, flags)?, busy_timeout)
}

fn configure(conn: Connection, busy_timeout: Duration) -> Result<Connection> {
    conn.busy_timeout(busy_timeout)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    let sql = include_str!("../migrations/0001_init.sql");
    conn.execute_batch(sql)?;
    Ok(())
}

pub fn open_and_migrate(path: &str, busy_timeout: Duration) -> Result<Connection> {
    let conn = open(path, busy_timeout)?;
    migrate(&conn)?;
    Ok(conn)
}

pub fn with_test_db() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    migrate(&conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_is_repeatable() {
        let conn = with_test_db().unwrap();
        migrate(&conn).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('ai_logs', 'telemetry_events')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn file_databases_use_wal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ingest.db");
        let conn = open_and_migrate(path.to_str().unwrap(), DEFAULT_BUSY_TIMEOUT).unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn open_existing_refuses_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");

        assert!(open_existing(path.to_str().unwrap(), DEFAULT_BUSY_TIMEOUT).is_err());
        assert!(!path.exists());

        open_and_migrate(path.to_str().unwrap(), DEFAULT_BUSY_TIMEOUT).unwrap();
        assert!(open_existing(path.to_str().unwrap(), DEFAULT_BUSY_TIMEOUT).is_ok());
    }
}
