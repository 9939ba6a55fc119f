//! Domain layer for the template-sync backend.
//!
//! This crate contains:
//! - CMS response, rich-text document and change notification models
//! - The message template domain model
//! - The ingestion pipeline services (decoding, fetching, transforming)
//! - Collaborator traits for the object store and template store
//! - Domain error types

pub mod errors;
pub mod models;
pub mod services;
