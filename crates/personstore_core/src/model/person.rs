//! Person domain model.
//!
//! # Responsibility
//! - Define the record stored in the `persons` collection.
//! - Define create/update payloads and page requests.
//!
//! # Invariants
//! - `id` is assigned once on create and never changes afterwards.
//! - Serialized shape is exactly `{ "id", "name", "age" }`.
//! - Page numbers and page sizes start at 1.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a stored person.
///
/// Stored as a plain string field key; generated ids are UUID v4 text.
pub type PersonId = String;

/// Default page number applied when the caller does not supply one.
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size applied when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Canonical stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub age: i64,
}

/// Create/update payload. Any `id` sent by a client is not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDraft {
    pub name: String,
    pub age: i64,
}

/// Validation errors for person payloads and page requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    MissingId,
    ZeroPage,
    ZeroPageSize,
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => write!(f, "person id cannot be empty"),
            Self::ZeroPage => write!(f, "page must be >= 1"),
            Self::ZeroPageSize => write!(f, "page size must be >= 1"),
        }
    }
}

impl Error for PersonValidationError {}

impl Person {
    /// Creates a person with a freshly generated id.
    pub fn new(name: impl Into<String>, age: i64) -> Self {
        Self::with_id(generate_person_id(), name, age)
    }

    /// Creates a person with a caller-provided id.
    ///
    /// Used by update paths where the identity already exists.
    pub fn with_id(id: impl Into<PersonId>, name: impl Into<String>, age: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age,
        }
    }

    /// Builds a stored record from a draft and an assigned id.
    pub fn from_draft(id: impl Into<PersonId>, draft: PersonDraft) -> Self {
        Self::with_id(id, draft.name, draft.age)
    }

    /// Replaces mutable fields with the draft values, keeping `id`.
    pub fn apply(&mut self, draft: PersonDraft) {
        self.name = draft.name;
        self.age = draft.age;
    }

    /// Checks invariants required before overwriting an existing entry.
    pub fn validate_for_update(&self) -> Result<(), PersonValidationError> {
        if self.id.trim().is_empty() {
            return Err(PersonValidationError::MissingId);
        }
        Ok(())
    }
}

impl PersonDraft {
    pub fn new(name: impl Into<String>, age: i64) -> Self {
        Self {
            name: name.into(),
            age,
        }
    }
}

/// One-based page window over the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    pub fn validate(&self) -> Result<(), PersonValidationError> {
        if self.page == 0 {
            return Err(PersonValidationError::ZeroPage);
        }
        if self.size == 0 {
            return Err(PersonValidationError::ZeroPageSize);
        }
        Ok(())
    }

    /// Zero-based index of the first entry on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)).saturating_mul(u64::from(self.size))
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }
}

/// Generates a new globally unique person id.
pub fn generate_person_id() -> PersonId {
    Uuid::new_v4().to_string()
}
