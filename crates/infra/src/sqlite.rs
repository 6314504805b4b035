//! SQLite-backed store adapter.
//!
//! Values are encoded to JSON at this boundary — the pipeline above never
//! sees anything but the opaque payload type. One table, upsert writes,
//! WAL journaling for file-backed databases.

use std::marker::PhantomData;
use std::path::Path;

use cachepipe_core::{CacheResult, CacheValue, Store};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// A key/value store persisted in a SQLite database.
///
/// A real backend for the terminal end of a pipeline. Values must be
/// serde-serializable; they are stored as JSON text under their key.
///
/// # Example
/// ```
/// use cachepipe_infra::SqliteStore;
/// use cachepipe_core::Store;
///
/// let store: SqliteStore<String> = SqliteStore::in_memory()?;
/// store.write("greeting", "hello".to_string())?;
/// assert_eq!(store.read("greeting")?.as_deref(), Some("hello"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SqliteStore<V> {
    conn: Mutex<Connection>,
    _values: PhantomData<fn() -> V>,
}

impl<V> SqliteStore<V>
where
    V: CacheValue + Serialize + DeserializeOwned,
{
    /// Open (or create) a database file and prepare the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        // WAL keeps readers and the writer out of each other's way and
        // gives `flush` a real checkpoint to perform.
        let journal_mode: String =
            conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        debug!(path = %path.as_ref().display(), %journal_mode, "opened sqlite store");
        Self::with_connection(conn)
    }

    /// Open a private in-memory database, mainly for tests and demos.
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )?;
        Ok(Self { conn: Mutex::new(conn), _values: PhantomData })
    }

    /// Number of stored entries.
    pub fn len(&self) -> StoreResult<usize> {
        let conn = self.conn.lock();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn read_value(&self, key: &str) -> StoreResult<Option<V>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT value FROM cache_entries WHERE key = ?1")?;
        let text: Option<String> =
            stmt.query_row(params![key], |row| row.get(0)).optional()?;
        match text {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn write_value(&self, key: &str, value: &V) -> StoreResult<()> {
        let text = serde_json::to_string(value)?;
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "INSERT INTO cache_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )?;
        stmt.execute(params![key, text])?;
        Ok(())
    }

    fn checkpoint(&self) -> StoreResult<()> {
        let conn = self.conn.lock();
        // Harmless single-row result when the database is not in WAL mode
        // (e.g. in-memory), so this stays a permitted no-op there.
        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        Ok(())
    }
}

impl<V> Store<V> for SqliteStore<V>
where
    V: CacheValue + Serialize + DeserializeOwned,
{
    fn read(&self, key: &str) -> CacheResult<Option<V>> {
        debug!(key, "sqlite store read");
        self.read_value(key).map_err(|e| e.into_cache("read"))
    }

    fn write(&self, key: &str, value: V) -> CacheResult<()> {
        debug!(key, "sqlite store write");
        self.write_value(key, &value).map_err(|e| e.into_cache("write"))
    }

    fn flush(&self) -> CacheResult<()> {
        debug!("sqlite store flush (wal checkpoint)");
        self.checkpoint().map_err(|e| e.into_cache("flush"))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for sqlite.
    use super::*;

    /// Validates `SqliteStore::in_memory` behavior for the round-trip
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms a written value reads back decoded.
    /// - Confirms an absent key reads as `None`.
    #[test]
    fn test_sqlite_round_trip() {
        let store: SqliteStore<Vec<u32>> = SqliteStore::in_memory().unwrap();

        store.write("nums", vec![1, 2, 3]).unwrap();
        assert_eq!(store.read("nums").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(store.read("missing").unwrap(), None);
    }

    /// Validates `SqliteStore::write` behavior for the upsert scenario.
    ///
    /// Assertions:
    /// - Confirms writing an existing key replaces the value.
    /// - Confirms the entry count stays at one.
    #[test]
    fn test_sqlite_upsert() {
        let store: SqliteStore<String> = SqliteStore::in_memory().unwrap();

        store.write("k", "first".to_string()).unwrap();
        store.write("k", "second".to_string()).unwrap();

        assert_eq!(store.read("k").unwrap().as_deref(), Some("second"));
        assert_eq!(store.len().unwrap(), 1);
    }

    /// Validates `SqliteStore::flush` behavior for the in-memory checkpoint
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures flush succeeds as a no-op without WAL.
    #[test]
    fn test_sqlite_flush_no_wal() {
        let store: SqliteStore<i32> = SqliteStore::in_memory().unwrap();
        store.write("k", 1).unwrap();
        store.flush().unwrap();
    }
}
