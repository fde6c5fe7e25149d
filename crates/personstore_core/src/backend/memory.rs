//! In-process hash backend.
//!
//! Fields of one collection are kept in key order, which gives every
//! enumeration the same order while the collection is unchanged.
//!
//! Commands never touch I/O and hold the lock only for one map operation, so
//! there is no per-call deadline here. The bound on a stuck command belongs to
//! the persistent backend: `SqliteHashBackend` fails with `SQLITE_BUSY` once
//! `StoreConfig::busy_timeout_ms` elapses.

use super::{BackendError, BackendResult, HashBackend, HashEntry};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type Collections = HashMap<String, BTreeMap<String, String>>;

/// Hash backend holding all collections in memory.
#[derive(Debug, Default)]
pub struct MemoryHashBackend {
    collections: RwLock<Collections>,
}

impl MemoryHashBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> BackendResult<RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|_| BackendError::LockPoisoned("memory"))
    }

    fn write(&self) -> BackendResult<RwLockWriteGuard<'_, Collections>> {
        self.collections
            .write()
            .map_err(|_| BackendError::LockPoisoned("memory"))
    }
}

impl HashBackend for MemoryHashBackend {
    fn hash_set(&self, collection: &str, field: &str, value: &str) -> BackendResult<()> {
        self.write()?
            .entry(collection.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    fn hash_get(&self, collection: &str, field: &str) -> BackendResult<Option<String>> {
        Ok(self
            .read()?
            .get(collection)
            .and_then(|fields| fields.get(field))
            .cloned())
    }

    fn hash_get_all(&self, collection: &str) -> BackendResult<Vec<HashEntry>> {
        Ok(self
            .read()?
            .get(collection)
            .map(|fields| {
                fields
                    .iter()
                    .map(|(field, value)| (field.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn hash_delete(&self, collection: &str, field: &str) -> BackendResult<u64> {
        let mut collections = self.write()?;
        let Some(fields) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let removed = fields.remove(field).map_or(0, |_| 1);
        if fields.is_empty() {
            collections.remove(collection);
        }
        Ok(removed)
    }

    fn hash_len(&self, collection: &str) -> BackendResult<u64> {
        Ok(self
            .read()?
            .get(collection)
            .map_or(0, |fields| fields.len() as u64))
    }

    fn hash_range(
        &self,
        collection: &str,
        offset: u64,
        limit: u64,
    ) -> BackendResult<Vec<HashEntry>> {
        let collections = self.read()?;
        let Some(fields) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(fields
            .iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect())
    }

    fn hash_set_existing(&self, collection: &str, field: &str, value: &str) -> BackendResult<bool> {
        let mut collections = self.write()?;
        match collections
            .get_mut(collection)
            .and_then(|fields| fields.get_mut(field))
        {
            Some(existing) => {
                *existing = value.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
