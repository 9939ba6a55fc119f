//! External service integrations.

pub mod s3;
pub mod sqs;

pub use s3::{S3Config, S3ObjectStore};
pub use sqs::{SqsConfig, SqsQueue};
