//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate hash command and serialization details from service code.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to
//!   backend transport errors.

pub mod person_repo;
