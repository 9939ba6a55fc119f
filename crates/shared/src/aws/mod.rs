//! AWS request signing primitives shared by the object store, queue and
//! key-value store clients.

pub mod credentials;
pub mod json_protocol;
pub mod sigv4;

pub use credentials::AwsCredentials;
pub use json_protocol::{JsonProtocolClient, JsonProtocolConfig, JsonProtocolError};
pub use sigv4::{sign_request, uri_encode_path, SignableRequest, SigningError, SigningParams};
