//! Domain model for stored person records.
//!
//! # Responsibility
//! - Define canonical data structures used by the record store.
//!
//! # Invariants
//! - Every stored record is identified by a stable `PersonId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod person;
