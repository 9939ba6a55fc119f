//! Store entity definitions.
//!
//! Entities are direct mappings to stored rows.

pub mod message_template;

pub use message_template::MessageTemplateEntity;
