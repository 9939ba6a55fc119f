//! Domain models for template-sync.

pub mod cms;
pub mod document;
pub mod message_template;
pub mod notification;

pub use cms::{CmsEntry, CmsResponse, EntryFields, EntryReference, Includes, Sys};
pub use document::{Document, Node, NodeKind};
pub use message_template::{MessageTemplate, TrafficType};
pub use notification::{ChangeNotification, ChangeRecord, ObjectLocation};
