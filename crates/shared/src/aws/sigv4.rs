//! AWS Signature Version 4 request signing.
//!
//! Produces the `x-amz-date`, `x-amz-content-sha256`, optional
//! `x-amz-security-token` and `authorization` headers for a request. Callers
//! attach the returned headers verbatim.

use chrono::{DateTime, Utc};
use hmac::digest::InvalidLength;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

use super::AwsCredentials;
use crate::crypto::{hmac_sha256, sha256_hex};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Characters left unescaped in canonical URIs (RFC 3986 unreserved set).
const URI_UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Errors produced while signing a request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SigningError {
    #[error("AWS credentials are not configured")]
    MissingCredentials,

    #[error("AWS region is not configured")]
    MissingRegion,

    #[error("Invalid signing key: {0}")]
    InvalidKey(#[from] InvalidLength),
}

/// Who signs, where, and when.
#[derive(Debug, Clone, Copy)]
pub struct SigningParams<'a> {
    pub credentials: &'a AwsCredentials,
    pub region: &'a str,
    pub service: &'a str,
    pub time: DateTime<Utc>,
}

/// The parts of an HTTP request covered by the signature.
#[derive(Debug, Clone)]
pub struct SignableRequest<'a> {
    pub method: &'a str,
    /// Host header value, including a non-default port.
    pub host: &'a str,
    /// Canonical (already URI-encoded) path.
    pub path: &'a str,
    /// Canonical query string, empty when the request has none.
    pub query: &'a str,
    /// Additional headers to include in the signature.
    pub headers: Vec<(&'a str, &'a str)>,
    pub payload: &'a [u8],
}

/// Signs a request and returns the headers to attach to it.
pub fn sign_request(
    request: &SignableRequest<'_>,
    params: &SigningParams<'_>,
) -> Result<Vec<(String, String)>, SigningError> {
    let credentials = params.credentials;
    if credentials.access_key_id.is_empty() || credentials.secret_access_key.is_empty() {
        return Err(SigningError::MissingCredentials);
    }
    if params.region.is_empty() {
        return Err(SigningError::MissingRegion);
    }

    let amz_date = params.time.format("%Y%m%dT%H%M%SZ").to_string();
    let date = params.time.format("%Y%m%d").to_string();
    let payload_hash = sha256_hex(request.payload);

    let mut headers: Vec<(String, String)> = request
        .headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), normalize_header_value(value)))
        .collect();
    headers.push(("host".to_string(), request.host.to_string()));
    headers.push(("x-amz-content-sha256".to_string(), payload_hash.clone()));
    headers.push(("x-amz-date".to_string(), amz_date.clone()));
    if let Some(token) = &credentials.session_token {
        headers.push(("x-amz-security-token".to_string(), token.clone()));
    }
    headers.sort_by(|a, b| a.0.cmp(&b.0));

    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect();
    let signed_headers = headers
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let path = if request.path.is_empty() {
        "/"
    } else {
        request.path
    };
    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.method, path, request.query, canonical_headers, signed_headers, payload_hash
    );

    let scope = format!(
        "{}/{}/{}/aws4_request",
        date, params.region, params.service
    );
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(
        &credentials.secret_access_key,
        &date,
        params.region,
        params.service,
    )?;
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

    let mut signed = vec![
        ("x-amz-date".to_string(), amz_date),
        ("x-amz-content-sha256".to_string(), payload_hash),
    ];
    if let Some(token) = &credentials.session_token {
        signed.push(("x-amz-security-token".to_string(), token.clone()));
    }
    signed.push((
        "authorization".to_string(),
        format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, credentials.access_key_id, scope, signed_headers, signature
        ),
    ));

    Ok(signed)
}

/// URI-encodes each segment of a path, keeping the `/` separators.
pub fn uri_encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, URI_UNRESERVED).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn derive_signing_key(
    secret: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, InvalidLength> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn normalize_header_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
