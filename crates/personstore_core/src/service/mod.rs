//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the API/CLI layers decoupled from storage details.

pub mod person_service;
