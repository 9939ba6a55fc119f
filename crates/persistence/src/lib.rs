//! Persistence layer for the template-sync backend.
//!
//! This crate contains:
//! - Store construction from configuration
//! - The key-value store abstraction with DynamoDB and in-memory backends
//! - Entity definitions (wide-row mappings)
//! - Repository implementations

pub mod db;
pub mod dynamodb;
pub mod entities;
pub mod item;
pub mod kv_store;
pub mod metrics;
pub mod repositories;
