//! Person use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points for core callers.
//! - Implement the fetch-merge-update flow behind full-record replacement.
//!
//! # Invariants
//! - Service APIs never bypass repository serialization/persistence.
//! - `update_person` is read-then-write and not atomic; concurrent updates
//!   of one id may lose writes.

use crate::model::person::{PageRequest, Person, PersonDraft};
use crate::repo::person_repo::{PersonRepository, RepoResult};

/// Use-case service wrapper for person CRUD operations.
pub struct PersonService<R: PersonRepository> {
    repo: R,
}

impl<R: PersonRepository> PersonService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Creates a person and returns it with its generated id.
    pub fn create_person(&self, draft: &PersonDraft) -> RepoResult<Person> {
        self.repo.create_person(draft)
    }

    pub fn get_person(&self, id: &str) -> RepoResult<Person> {
        self.repo.get_person(id)
    }

    pub fn list_persons(&self, page: PageRequest) -> RepoResult<Vec<Person>> {
        self.repo.list_persons(page)
    }

    /// Replaces `name` and `age` of an existing person.
    ///
    /// # Contract
    /// - Fails with `NotFound` when `id` is not stored.
    /// - Returns the record as written.
    pub fn update_person(&self, id: &str, draft: PersonDraft) -> RepoResult<Person> {
        let mut person = self.repo.get_person(id)?;
        person.apply(draft);
        self.repo.update_person(&person)
    }

    pub fn delete_person(&self, id: &str) -> RepoResult<()> {
        self.repo.delete_person(id)
    }

    pub fn count_persons(&self) -> RepoResult<u64> {
        self.repo.count_persons()
    }
}
