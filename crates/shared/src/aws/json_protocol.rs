//! Signed client for AWS services that speak the JSON protocol.
//!
//! Every call is a `POST /` carrying an `X-Amz-Target: <prefix>.<Operation>`
//! header and a JSON body. Non-2xx responses carry `{"__type", "message"}`.
//! DynamoDB and SQS both use this wire format.

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::sigv4::{sign_request, SignableRequest, SigningError, SigningParams};
use super::AwsCredentials;

const CONTENT_TYPE: &str = "application/x-amz-json-1.0";

/// Errors from a JSON-protocol call. Service clients map these onto their
/// own error types.
#[derive(Debug, Error)]
pub enum JsonProtocolError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Service returned status {status} ({error_type}): {message}")]
    Service {
        status: u16,
        error_type: String,
        message: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to sign request: {0}")]
    Signing(#[from] SigningError),
}

/// Which service to talk to and how.
#[derive(Debug, Clone)]
pub struct JsonProtocolConfig {
    /// Signing name, e.g. `dynamodb` or `sqs`.
    pub service: &'static str,
    /// `X-Amz-Target` prefix, e.g. `DynamoDB_20120810`.
    pub target_prefix: &'static str,
    pub region: String,
    /// Overrides `https://<service>.<region>.amazonaws.com`.
    pub endpoint: Option<String>,
    pub credentials: AwsCredentials,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct JsonProtocolClient {
    http: Client,
    url: Url,
    host: String,
    service: &'static str,
    target_prefix: &'static str,
    region: String,
    credentials: AwsCredentials,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(alias = "Message", default)]
    message: String,
}

impl JsonProtocolClient {
    pub fn new(config: JsonProtocolConfig) -> Result<Self, JsonProtocolError> {
        let endpoint = config.endpoint.clone().unwrap_or_else(|| {
            format!("https://{}.{}.amazonaws.com", config.service, config.region)
        });
        let url = Url::parse(&endpoint).map_err(|e| {
            JsonProtocolError::Transport(format!("invalid endpoint {}: {}", endpoint, e))
        })?;
        let host = host_header(&url).ok_or_else(|| {
            JsonProtocolError::Transport(format!("endpoint {} has no host", endpoint))
        })?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| JsonProtocolError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            url,
            host,
            service: config.service,
            target_prefix: config.target_prefix,
            region: config.region,
            credentials: config.credentials,
        })
    }

    /// Host header value the requests are signed for.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Invokes `operation` with `body` and decodes the JSON response.
    pub async fn call<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: &Value,
    ) -> Result<T, JsonProtocolError> {
        let payload = serde_json::to_vec(body)
            .map_err(|e| JsonProtocolError::InvalidResponse(e.to_string()))?;
        let target = format!("{}.{}", self.target_prefix, operation);

        let signed = sign_request(
            &SignableRequest {
                method: "POST",
                host: &self.host,
                path: "/",
                query: "",
                headers: vec![
                    ("content-type", CONTENT_TYPE),
                    ("x-amz-target", target.as_str()),
                ],
                payload: &payload,
            },
            &SigningParams {
                credentials: &self.credentials,
                region: &self.region,
                service: self.service,
                time: Utc::now(),
            },
        )?;

        let mut request = self
            .http
            .post(self.url.clone())
            .header("content-type", CONTENT_TYPE)
            .header("x-amz-target", &target);
        for (name, value) in signed {
            request = request.header(name, value);
        }

        debug!(service = self.service, operation = %operation, "Sending AWS request");
        let response = request
            .body(payload)
            .send()
            .await
            .map_err(|e| JsonProtocolError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| JsonProtocolError::Transport(e.to_string()))?;

        if !status.is_success() {
            let error = parse_service_error(status.as_u16(), &bytes);
            warn!(service = self.service, operation = %operation, error = %error, "AWS request failed");
            return Err(error);
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| JsonProtocolError::InvalidResponse(e.to_string()))
    }
}

/// Decodes a JSON-protocol error body, keeping the text after `#` in `__type`.
pub fn parse_service_error(status: u16, body: &[u8]) -> JsonProtocolError {
    match serde_json::from_slice::<ServiceErrorBody>(body) {
        Ok(error) => JsonProtocolError::Service {
            status,
            error_type: error
                .error_type
                .rsplit('#')
                .next()
                .unwrap_or_default()
                .to_string(),
            message: error.message,
        },
        Err(_) => JsonProtocolError::Service {
            status,
            error_type: "Unknown".to_string(),
            message: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

/// Host header value for a URL: host plus port when it is not the scheme default.
fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
