//! Shared utilities and common types for the template-sync backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Hashing helpers (SHA-256, HMAC-SHA256)
//! - AWS Signature Version 4 request signing
//! - Object key decoding for storage event notifications

pub mod aws;
pub mod crypto;
pub mod object_key;
