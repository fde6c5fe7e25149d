//! Person repository contracts and hash-backend implementation.
//!
//! # Responsibility
//! - Provide CRUD + pagination over the `persons` hash collection.
//! - Keep serialization and backend command details inside the store.
//!
//! # Invariants
//! - Each stored field value is the JSON encoding of the `Person` whose id is
//!   the field key.
//! - Read paths reject corrupt stored values instead of masking them, unless
//!   the list policy is `CorruptEntryPolicy::Skip`.
//! - Backend errors are surfaced before any result is interpreted.
//! - The repository holds no mutable state; concurrency control is left to
//!   per-command atomicity of the backend.

use crate::backend::{BackendError, HashBackend, HashEntry};
use crate::config::{CorruptEntryPolicy, PaginationMode, StoreConfig, UpdateMode};
use crate::model::person::{
    generate_person_id, PageRequest, Person, PersonDraft, PersonId, PersonValidationError,
};
use log::{debug, warn};
use serde::de::Error as _;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error taxonomy surfaced by record store operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(PersonValidationError),
    /// Input could not be encoded, or a stored value could not be decoded.
    Serialization {
        id: Option<PersonId>,
        source: serde_json::Error,
    },
    NotFound(PersonId),
    Backend(BackendError),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Serialization { .. } => "serialization",
            Self::NotFound(_) => "not_found",
            Self::Backend(_) => "backend",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Serialization {
                id: Some(id),
                source,
            } => write!(f, "invalid stored person `{id}`: {source}"),
            Self::Serialization { id: None, source } => {
                write!(f, "person serialization failed: {source}")
            }
            Self::NotFound(id) => write!(f, "person not found: {id}"),
            Self::Backend(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Serialization { source, .. } => Some(source),
            Self::NotFound(_) => None,
            Self::Backend(err) => Some(err),
        }
    }
}

impl From<PersonValidationError> for RepoError {
    fn from(value: PersonValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<BackendError> for RepoError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            id: None,
            source: value,
        }
    }
}

/// Repository interface for person CRUD operations.
pub trait PersonRepository {
    /// Stores a new person under a freshly generated id.
    fn create_person(&self, draft: &PersonDraft) -> RepoResult<Person>;
    fn get_person(&self, id: &str) -> RepoResult<Person>;
    /// Returns one page in backend enumeration order.
    fn list_persons(&self, page: PageRequest) -> RepoResult<Vec<Person>>;
    /// Overwrites the full record stored under `person.id`.
    fn update_person(&self, person: &Person) -> RepoResult<Person>;
    fn delete_person(&self, id: &str) -> RepoResult<()>;
    fn count_persons(&self) -> RepoResult<u64>;
}

/// Record store over one hash collection of an injected backend.
pub struct HashPersonRepository<B: HashBackend> {
    backend: B,
    collection: String,
    update_mode: UpdateMode,
    pagination: PaginationMode,
    corrupt_entries: CorruptEntryPolicy,
}

impl<B: HashBackend> HashPersonRepository<B> {
    /// Creates a repository with default configuration.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, &StoreConfig::default())
    }

    pub fn with_config(backend: B, config: &StoreConfig) -> Self {
        Self {
            backend,
            collection: config.collection.clone(),
            update_mode: config.update_mode,
            pagination: config.pagination,
            corrupt_entries: config.corrupt_entries,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn write_new(&self, person: &Person) -> RepoResult<()> {
        let value = encode_person(person)?;
        self.backend
            .hash_set(&self.collection, &person.id, &value)?;
        Ok(())
    }

    fn overwrite(&self, person: &Person) -> RepoResult<Person> {
        person.validate_for_update()?;
        let value = encode_person(person)?;
        match self.update_mode {
            UpdateMode::Strict => {
                let written = self
                    .backend
                    .hash_set_existing(&self.collection, &person.id, &value)?;
                if !written {
                    return Err(RepoError::NotFound(person.id.clone()));
                }
            }
            UpdateMode::Upsert => {
                self.backend
                    .hash_set(&self.collection, &person.id, &value)?;
            }
        }
        Ok(person.clone())
    }

    fn fetch_page(&self, page: PageRequest) -> RepoResult<Vec<HashEntry>> {
        let entries = match self.pagination {
            PaginationMode::Ranged => {
                self.backend
                    .hash_range(&self.collection, page.offset(), page.limit())?
            }
            PaginationMode::FullScan => {
                let all = self.backend.hash_get_all(&self.collection)?;
                slice_page(all, page)
            }
        };
        Ok(entries)
    }

    fn decode_page(&self, entries: Vec<HashEntry>) -> RepoResult<Vec<Person>> {
        let mut persons = Vec::with_capacity(entries.len());
        for (field, value) in entries {
            match decode_person(&field, &value) {
                Ok(person) => persons.push(person),
                Err(err) if self.corrupt_entries == CorruptEntryPolicy::Skip => {
                    warn!(
                        "event=person_list module=repo status=skipped collection={} id={} error={}",
                        self.collection, field, err
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(persons)
    }
}

impl<B: HashBackend> PersonRepository for HashPersonRepository<B> {
    fn create_person(&self, draft: &PersonDraft) -> RepoResult<Person> {
        let started_at = Instant::now();
        let person = Person::from_draft(generate_person_id(), draft.clone());
        let result = self.write_new(&person).map(|()| person);
        log_outcome("person_create", &self.collection, started_at, &result, |person| {
            format!("id={}", person.id)
        });
        result
    }

    fn get_person(&self, id: &str) -> RepoResult<Person> {
        let started_at = Instant::now();
        let result = match self.backend.hash_get(&self.collection, id) {
            Ok(Some(value)) => decode_person(id, &value),
            Ok(None) => Err(RepoError::NotFound(id.to_string())),
            Err(err) => Err(err.into()),
        };
        log_outcome("person_get", &self.collection, started_at, &result, |person| {
            format!("id={}", person.id)
        });
        result
    }

    fn list_persons(&self, page: PageRequest) -> RepoResult<Vec<Person>> {
        let started_at = Instant::now();
        let result = page
            .validate()
            .map_err(RepoError::from)
            .and_then(|()| self.fetch_page(page))
            .and_then(|entries| self.decode_page(entries));
        log_outcome("person_list", &self.collection, started_at, &result, |persons| {
            format!(
                "page={} size={} returned={}",
                page.page,
                page.size,
                persons.len()
            )
        });
        result
    }

    fn update_person(&self, person: &Person) -> RepoResult<Person> {
        let started_at = Instant::now();
        let result = self.overwrite(person);
        log_outcome("person_update", &self.collection, started_at, &result, |person| {
            format!("id={}", person.id)
        });
        result
    }

    fn delete_person(&self, id: &str) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self
            .backend
            .hash_delete(&self.collection, id)
            .map_err(RepoError::from)
            .and_then(|removed| {
                if removed == 0 {
                    Err(RepoError::NotFound(id.to_string()))
                } else {
                    Ok(())
                }
            });
        log_outcome("person_delete", &self.collection, started_at, &result, |_| {
            format!("id={id}")
        });
        result
    }

    fn count_persons(&self) -> RepoResult<u64> {
        Ok(self.backend.hash_len(&self.collection)?)
    }
}

fn encode_person(person: &Person) -> RepoResult<String> {
    serde_json::to_string(person).map_err(|source| RepoError::Serialization {
        id: Some(person.id.clone()),
        source,
    })
}

fn decode_person(field: &str, value: &str) -> RepoResult<Person> {
    let serialization = |source: serde_json::Error| RepoError::Serialization {
        id: Some(field.to_string()),
        source,
    };
    let person: Person = serde_json::from_str(value).map_err(serialization)?;
    if person.id != field {
        return Err(serialization(serde_json::Error::custom(format!(
            "stored id `{}` does not match field key",
            person.id
        ))));
    }
    Ok(person)
}

fn slice_page(entries: Vec<HashEntry>, page: PageRequest) -> Vec<HashEntry> {
    entries
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
        .collect()
}

fn log_outcome<T>(
    event: &str,
    collection: &str,
    started_at: Instant,
    result: &RepoResult<T>,
    describe: impl FnOnce(&T) -> String,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(value) => debug!(
            "event={} module=repo status=ok collection={} {} duration_ms={}",
            event,
            collection,
            describe(value),
            duration_ms
        ),
        Err(err) if err.is_not_found() => debug!(
            "event={} module=repo status=not_found collection={} duration_ms={}",
            event, collection, duration_ms
        ),
        Err(err) => warn!(
            "event={} module=repo status=error collection={} duration_ms={} error_code={} error={}",
            event,
            collection,
            duration_ms,
            err.code(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_person, slice_page, RepoError};
    use crate::model::person::PageRequest;

    #[test]
    fn decode_rejects_mismatched_id() {
        let err = decode_person("a", r#"{"id":"b","name":"Ann","age":30}"#).unwrap_err();
        assert!(matches!(err, RepoError::Serialization { id: Some(ref id), .. } if id == "a"));
    }

    #[test]
    fn decode_rejects_missing_fields() {
        let err = decode_person("a", r#"{"id":"a","name":"Ann"}"#).unwrap_err();
        assert!(matches!(err, RepoError::Serialization { .. }));
    }

    #[test]
    fn slice_page_clamps_to_collection() {
        let entries: Vec<(String, String)> = (0..5)
            .map(|index| (index.to_string(), String::new()))
            .collect();
        assert_eq!(slice_page(entries.clone(), PageRequest::new(2, 2)).len(), 2);
        assert_eq!(slice_page(entries.clone(), PageRequest::new(3, 2)).len(), 1);
        assert!(slice_page(entries, PageRequest::new(4, 2)).is_empty());
    }
}
