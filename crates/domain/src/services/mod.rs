//! Domain services for template-sync.
//!
//! The ingestion pipeline and the collaborator traits it depends on.

pub mod content_fetcher;
pub mod event_decoder;
pub mod ingestor;
pub mod template_store;
pub mod transformer;

pub use content_fetcher::{ContentFetcher, ObjectStore};
pub use event_decoder::resolve_locations;
pub use ingestor::{Acknowledgement, EventIngestor, IngestReport};
pub use template_store::TemplateStore;
pub use transformer::DocumentTransformer;

#[cfg(any(test, feature = "testing"))]
pub use content_fetcher::MockObjectStore;
#[cfg(any(test, feature = "testing"))]
pub use ingestor::MockAcknowledgement;
#[cfg(any(test, feature = "testing"))]
pub use template_store::MockTemplateStore;
