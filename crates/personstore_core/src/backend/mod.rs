//! Key-value hash backend contract.
//!
//! # Responsibility
//! - Define the narrow set of hash-field commands the record store needs.
//! - Provide fallback implementations for optional commands so that a
//!   backend only has to supply the four primitive operations.
//!
//! # Invariants
//! - Every single command is atomic with respect to other commands.
//! - `hash_get_all` and `hash_range` enumerate fields in one order per
//!   backend while the collection is not mutated.
//! - Backends never interpret stored values; they are opaque UTF-8 text.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryHashBackend;
pub use sqlite::SqliteHashBackend;

pub type BackendResult<T> = Result<T, BackendError>;

/// One `(field, value)` entry of a hash collection.
pub type HashEntry = (String, String);

/// Transport or command failure reported by a hash backend.
#[derive(Debug)]
pub enum BackendError {
    Db(DbError),
    LockPoisoned(&'static str),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::LockPoisoned(backend) => write!(f, "{backend} backend lock poisoned"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::LockPoisoned(_) => None,
        }
    }
}

impl From<DbError> for BackendError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for BackendError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Hash-field commands against a named collection.
pub trait HashBackend: Send + Sync {
    /// Writes `field -> value`, creating or overwriting the field.
    fn hash_set(&self, collection: &str, field: &str, value: &str) -> BackendResult<()>;

    /// Reads one field; `None` when it does not exist.
    fn hash_get(&self, collection: &str, field: &str) -> BackendResult<Option<String>>;

    /// Reads every field of the collection in backend enumeration order.
    fn hash_get_all(&self, collection: &str) -> BackendResult<Vec<HashEntry>>;

    /// Removes one field and returns how many fields were removed.
    fn hash_delete(&self, collection: &str, field: &str) -> BackendResult<u64>;

    /// Number of fields in the collection.
    fn hash_len(&self, collection: &str) -> BackendResult<u64> {
        Ok(self.hash_get_all(collection)?.len() as u64)
    }

    /// Reads at most `limit` fields starting at enumeration index `offset`.
    ///
    /// The fallback loads the whole collection; backends with a native
    /// windowed read should override it.
    fn hash_range(
        &self,
        collection: &str,
        offset: u64,
        limit: u64,
    ) -> BackendResult<Vec<HashEntry>> {
        let entries = self.hash_get_all(collection)?;
        Ok(entries
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    /// Overwrites `field` only if it already exists; returns whether it did.
    ///
    /// The fallback is a read followed by a write and is not atomic.
    fn hash_set_existing(&self, collection: &str, field: &str, value: &str) -> BackendResult<bool> {
        if self.hash_get(collection, field)?.is_none() {
            return Ok(false);
        }
        self.hash_set(collection, field, value)?;
        Ok(true)
    }
}

macro_rules! forward_hash_backend {
    ($ty:ty) => {
        impl<B: HashBackend + ?Sized> HashBackend for $ty {
            fn hash_set(&self, collection: &str, field: &str, value: &str) -> BackendResult<()> {
                (**self).hash_set(collection, field, value)
            }

            fn hash_get(&self, collection: &str, field: &str) -> BackendResult<Option<String>> {
                (**self).hash_get(collection, field)
            }

            fn hash_get_all(&self, collection: &str) -> BackendResult<Vec<HashEntry>> {
                (**self).hash_get_all(collection)
            }

            fn hash_delete(&self, collection: &str, field: &str) -> BackendResult<u64> {
                (**self).hash_delete(collection, field)
            }

            fn hash_len(&self, collection: &str) -> BackendResult<u64> {
                (**self).hash_len(collection)
            }

            fn hash_range(
                &self,
                collection: &str,
                offset: u64,
                limit: u64,
            ) -> BackendResult<Vec<HashEntry>> {
                (**self).hash_range(collection, offset, limit)
            }

            fn hash_set_existing(
                &self,
                collection: &str,
                field: &str,
                value: &str,
            ) -> BackendResult<bool> {
                (**self).hash_set_existing(collection, field, value)
            }
        }
    };
}

forward_hash_backend!(&B);
forward_hash_backend!(Arc<B>);
forward_hash_backend!(Box<B>);
