//! Repository implementations for store operations.

pub mod message_template;

pub use message_template::MessageTemplateRepository;
