//! SQS client over the JSON protocol.
//!
//! Only the two calls the consumer needs are implemented: long-polling
//! `ReceiveMessage` and per-delivery `DeleteMessage`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::aws::{AwsCredentials, JsonProtocolClient, JsonProtocolConfig, JsonProtocolError};

use crate::jobs::{MessageQueue, QueueError, QueueMessage};

const SERVICE: &str = "sqs";
const TARGET_PREFIX: &str = "AmazonSQS";

/// Connection settings for [`SqsQueue`].
#[derive(Debug, Clone)]
pub struct SqsConfig {
    pub region: String,
    /// Overrides the regional endpoint, e.g. `http://localhost:4566`.
    pub endpoint: Option<String>,
    pub credentials: AwsCredentials,
    pub queue_url: String,
    /// Budget for one request on top of the long-poll wait.
    pub request_timeout: Duration,
    pub wait_time_secs: u32,
}

pub struct SqsQueue {
    client: JsonProtocolClient,
    queue_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReceiveOutput {
    #[serde(default)]
    messages: Vec<ReceivedMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReceivedMessage {
    message_id: String,
    receipt_handle: String,
    #[serde(default)]
    body: String,
}

impl SqsQueue {
    pub fn new(config: SqsConfig) -> Result<Self, QueueError> {
        // Long polls hold the connection open for the whole wait.
        let timeout = config.request_timeout + Duration::from_secs(config.wait_time_secs.into());
        let client = JsonProtocolClient::new(JsonProtocolConfig {
            service: SERVICE,
            target_prefix: TARGET_PREFIX,
            region: config.region,
            endpoint: config.endpoint,
            credentials: config.credentials,
            timeout,
        })?;

        Ok(Self {
            client,
            queue_url: config.queue_url,
        })
    }
}

impl From<JsonProtocolError> for QueueError {
    fn from(err: JsonProtocolError) -> Self {
        match err {
            JsonProtocolError::Transport(message) => QueueError::Transport(message),
            JsonProtocolError::Service {
                status,
                error_type,
                message,
            } => QueueError::Service {
                status,
                error_type,
                message,
            },
            JsonProtocolError::InvalidResponse(message) => QueueError::InvalidResponse(message),
            JsonProtocolError::Signing(e) => QueueError::Signing(e),
        }
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn receive(
        &self,
        max_messages: u32,
        wait_time_secs: u32,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let output: ReceiveOutput = self
            .client
            .call(
                "ReceiveMessage",
                &receive_request(&self.queue_url, max_messages, wait_time_secs),
            )
            .await?;

        Ok(output
            .messages
            .into_iter()
            .map(|message| QueueMessage {
                message_id: message.message_id,
                receipt_handle: message.receipt_handle,
                body: message.body,
            })
            .collect())
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let _: Value = self
            .client
            .call(
                "DeleteMessage",
                &delete_request(&self.queue_url, receipt_handle),
            )
            .await?;
        Ok(())
    }
}

fn receive_request(queue_url: &str, max_messages: u32, wait_time_secs: u32) -> Value {
    json!({
        "QueueUrl": queue_url,
        "MaxNumberOfMessages": max_messages,
        "WaitTimeSeconds": wait_time_secs,
    })
}

fn delete_request(queue_url: &str, receipt_handle: &str) -> Value {
    json!({
        "QueueUrl": queue_url,
        "ReceiptHandle": receipt_handle,
    })
}
