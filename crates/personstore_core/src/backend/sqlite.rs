//! SQLite-backed hash backend.
//!
//! # Responsibility
//! - Persist hash collections in the `hash_fields` table.
//! - Serve windowed reads server-side with `LIMIT/OFFSET`.
//!
//! # Invariants
//! - Enumeration order is creation order (`seq`); overwriting a field keeps
//!   its position.
//! - Every command is one SQL statement, so each is atomic.
//! - The busy timeout configured at open time bounds every command.

use super::{BackendError, BackendResult, HashBackend, HashEntry};
use crate::db::{open_db, open_db_in_memory, DbResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Hash backend sharing one SQLite connection between callers.
#[derive(Debug)]
pub struct SqliteHashBackend {
    conn: Mutex<Connection>,
}

impl SqliteHashBackend {
    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path, busy_timeout)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> BackendResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| BackendError::LockPoisoned("sqlite"))
    }
}

impl HashBackend for SqliteHashBackend {
    fn hash_set(&self, collection: &str, field: &str, value: &str) -> BackendResult<()> {
        self.conn()?.execute(
            "INSERT INTO hash_fields (collection, field, value)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (collection, field) DO UPDATE SET value = excluded.value;",
            params![collection, field, value],
        )?;
        Ok(())
    }

    fn hash_get(&self, collection: &str, field: &str) -> BackendResult<Option<String>> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM hash_fields WHERE collection = ?1 AND field = ?2;",
                params![collection, field],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn hash_get_all(&self, collection: &str) -> BackendResult<Vec<HashEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT field, value
             FROM hash_fields
             WHERE collection = ?1
             ORDER BY seq ASC;",
        )?;
        let rows = stmt.query_map([collection], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let entries = rows.collect::<rusqlite::Result<Vec<HashEntry>>>()?;
        Ok(entries)
    }

    fn hash_delete(&self, collection: &str, field: &str) -> BackendResult<u64> {
        let removed = self.conn()?.execute(
            "DELETE FROM hash_fields WHERE collection = ?1 AND field = ?2;",
            params![collection, field],
        )?;
        Ok(removed as u64)
    }

    fn hash_len(&self, collection: &str) -> BackendResult<u64> {
        let count = self.conn()?.query_row(
            "SELECT COUNT(*) FROM hash_fields WHERE collection = ?1;",
            [collection],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn hash_range(
        &self,
        collection: &str,
        offset: u64,
        limit: u64,
    ) -> BackendResult<Vec<HashEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT field, value
             FROM hash_fields
             WHERE collection = ?1
             ORDER BY seq ASC
             LIMIT ?2 OFFSET ?3;",
        )?;
        let rows = stmt.query_map(
            params![
                collection,
                i64::try_from(limit).unwrap_or(i64::MAX),
                i64::try_from(offset).unwrap_or(i64::MAX),
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let entries = rows.collect::<rusqlite::Result<Vec<HashEntry>>>()?;
        Ok(entries)
    }

    fn hash_set_existing(&self, collection: &str, field: &str, value: &str) -> BackendResult<bool> {
        let changed = self.conn()?.execute(
            "UPDATE hash_fields SET value = ?3 WHERE collection = ?1 AND field = ?2;",
            params![collection, field, value],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteHashBackend;
    use crate::backend::HashBackend;

    #[test]
    fn overwrite_keeps_creation_position() {
        let backend = SqliteHashBackend::open_in_memory().unwrap();
        for field in ["c", "a", "b"] {
            backend.hash_set("h", field, "v1").unwrap();
        }
        backend.hash_set("h", "c", "v2").unwrap();

        let all = backend.hash_get_all("h").unwrap();
        let fields: Vec<&str> = all.iter().map(|(field, _)| field.as_str()).collect();
        assert_eq!(fields, vec!["c", "a", "b"]);
        assert_eq!(all[0].1, "v2");
    }

    #[test]
    fn range_is_windowed_in_creation_order() {
        let backend = SqliteHashBackend::open_in_memory().unwrap();
        for field in ["c", "a", "b", "d"] {
            backend.hash_set("h", field, field).unwrap();
        }

        let window = backend.hash_range("h", 1, 2).unwrap();
        let fields: Vec<&str> = window.iter().map(|(field, _)| field.as_str()).collect();
        assert_eq!(fields, vec!["a", "b"]);
        assert!(backend.hash_range("h", 4, 2).unwrap().is_empty());
        assert_eq!(backend.hash_range("h", 0, u64::MAX).unwrap().len(), 4);
    }

    #[test]
    fn delete_reports_removed_count() {
        let backend = SqliteHashBackend::open_in_memory().unwrap();
        backend.hash_set("h", "a", "1").unwrap();
        assert_eq!(backend.hash_delete("h", "a").unwrap(), 1);
        assert_eq!(backend.hash_delete("h", "a").unwrap(), 0);
        assert_eq!(backend.hash_len("h").unwrap(), 0);
    }

    #[test]
    fn set_existing_is_update_only() {
        let backend = SqliteHashBackend::open_in_memory().unwrap();
        assert!(!backend.hash_set_existing("h", "a", "1").unwrap());
        assert_eq!(backend.hash_get("h", "a").unwrap(), None);

        backend.hash_set("h", "a", "1").unwrap();
        assert!(backend.hash_set_existing("h", "a", "2").unwrap());
        assert_eq!(backend.hash_get("h", "a").unwrap().as_deref(), Some("2"));
    }
}
