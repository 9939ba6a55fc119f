//! S3-compatible object store.
//!
//! Implements the ObjectStore trait with signed `GET` requests. Buckets are
//! addressed virtual-hosted style (`<bucket>.s3.<region>.amazonaws.com`)
//! unless path style is forced, an endpoint override is configured, or the
//! bucket name contains a dot (the wildcard certificate covers one label).
//!
//! The signed path is always the path the request is sent to. Keys with `.`
//! or `..` segments would be collapsed by URL normalization, so they are
//! rejected instead of being fetched from a different location.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use domain::errors::ObjectStoreError;
use domain::services::ObjectStore;
use reqwest::{Client, StatusCode, Url};
use shared::aws::{sign_request, uri_encode_path, AwsCredentials, SignableRequest, SigningParams};
use tracing::{debug, warn};

const SERVICE: &str = "s3";
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for [`S3ObjectStore`].
#[derive(Debug, Clone)]
pub struct S3Config {
    pub region: String,
    /// Overrides the regional endpoint, e.g. `http://localhost:4566`.
    pub endpoint: Option<String>,
    pub credentials: AwsCredentials,
    pub force_path_style: bool,
    pub timeout: Duration,
}

/// Where one object lives on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ObjectTarget {
    url: Url,
    host: String,
    path: String,
}

pub struct S3ObjectStore {
    client: Client,
    scheme: String,
    /// Host (and non-default port) without any bucket prefix.
    service_host: String,
    path_style: bool,
    region: String,
    credentials: AwsCredentials,
}

impl S3ObjectStore {
    pub fn new(config: S3Config) -> Result<Self, ObjectStoreError> {
        let (scheme, service_host) = match &config.endpoint {
            Some(endpoint) => {
                let url = Url::parse(endpoint).map_err(|e| {
                    ObjectStoreError::Transport(format!("invalid endpoint {}: {}", endpoint, e))
                })?;
                let host = url.host_str().ok_or_else(|| {
                    ObjectStoreError::Transport(format!("endpoint {} has no host", endpoint))
                })?;
                let host = match url.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                };
                (url.scheme().to_string(), host)
            }
            None => (
                "https".to_string(),
                format!("s3.{}.amazonaws.com", config.region),
            ),
        };

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ObjectStoreError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            scheme,
            service_host,
            path_style: config.force_path_style || config.endpoint.is_some(),
            region: config.region,
            credentials: config.credentials,
        })
    }

    fn target(&self, container: &str, key: &str) -> Result<ObjectTarget, ObjectStoreError> {
        let encoded_key = uri_encode_path(key);
        let (host, path) = if self.path_style || container.contains('.') {
            (
                self.service_host.clone(),
                format!("/{}/{}", uri_encode_path(container), encoded_key),
            )
        } else {
            (
                format!("{}.{}", container, self.service_host),
                format!("/{}", encoded_key),
            )
        };

        let raw = format!("{}://{}{}", self.scheme, host, path);
        let url = Url::parse(&raw)
            .map_err(|e| ObjectStoreError::Transport(format!("invalid object URL {}: {}", raw, e)))?;
        if url.path() != path {
            return Err(ObjectStoreError::UnaddressableKey(key.to_string()));
        }

        Ok(ObjectTarget { url, host, path })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let target = self.target(container, key)?;

        let signed = sign_request(
            &SignableRequest {
                method: "GET",
                host: &target.host,
                path: &target.path,
                query: "",
                headers: Vec::new(),
                payload: b"",
            },
            &SigningParams {
                credentials: &self.credentials,
                region: &self.region,
                service: SERVICE,
                time: Utc::now(),
            },
        )
        .map_err(|e| ObjectStoreError::Transport(e.to_string()))?;

        let mut request = self.client.get(target.url);
        for (name, value) in signed {
            request = request.header(name, value);
        }

        debug!(container = %container, key = %key, "Fetching object");
        let response = request
            .send()
            .await
            .map_err(|e| ObjectStoreError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ObjectStoreError::Transport(e.to_string()))?;

        if !status.is_success() {
            let error = status_error(status, &bytes);
            warn!(container = %container, key = %key, error = %error, "Object fetch failed");
            return Err(error);
        }

        Ok(bytes.to_vec())
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> ObjectStoreError {
    if status == StatusCode::NOT_FOUND {
        return ObjectStoreError::NotFound;
    }
    ObjectStoreError::Status {
        status: status.as_u16(),
        message: error_message(body),
    }
}

/// Pulls `<Message>` out of an S3 XML error body, or falls back to the raw text.
fn error_message(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let message = text
        .split_once("<Message>")
        .and_then(|(_, rest)| rest.split_once("</Message>"))
        .map(|(message, _)| message.trim().to_string());

    match message {
        Some(message) => message,
        None => text.trim().chars().take(MAX_ERROR_BODY).collect(),
    }
}
