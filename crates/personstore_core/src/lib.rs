//! Core record storage for person records kept in a key-value hash.
//! This crate is the single source of truth for storage invariants.

pub mod api;
pub mod backend;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use api::ApiResponse;
pub use backend::{BackendError, BackendResult, HashBackend, MemoryHashBackend, SqliteHashBackend};
pub use config::{ConfigError, CorruptEntryPolicy, PaginationMode, StoreConfig, UpdateMode};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::person::{PageRequest, Person, PersonDraft, PersonId, PersonValidationError};
pub use repo::person_repo::{HashPersonRepository, PersonRepository, RepoError, RepoResult};
pub use service::person_service::PersonService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
