//! Queue consumer that feeds change notifications to the ingestor.
//!
//! Messages of one batch are processed concurrently, but acknowledgements
//! (queue deletes) are released strictly in receipt order. A message whose
//! processing fails is never deleted; the queue's visibility timeout brings
//! it back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use domain::services::{Acknowledgement, EventIngestor};
use futures::stream::{self, StreamExt};
use shared::aws::SigningError;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

use crate::config::QueueConfig;
use crate::middleware::message_span;
use crate::middleware::metrics::{record_queue_message, MessageOutcome};

/// One message received from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: String,
    /// Opaque handle used to delete (acknowledge) this delivery.
    pub receipt_handle: String,
    pub body: String,
}

/// Errors talking to the message queue.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue request failed: {0}")]
    Transport(String),

    #[error("Queue returned status {status} ({error_type}): {message}")]
    Service {
        status: u16,
        error_type: String,
        message: String,
    },

    #[error("Invalid queue response: {0}")]
    InvalidResponse(String),

    #[error("Failed to sign queue request: {0}")]
    Signing(#[from] SigningError),
}

/// Source of change notifications with explicit per-message deletion.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Long-polls for up to `max_messages` messages.
    async fn receive(
        &self,
        max_messages: u32,
        wait_time_secs: u32,
    ) -> Result<Vec<QueueMessage>, QueueError>;

    /// Deletes one delivery, marking it consumed.
    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError>;
}

/// Polling and concurrency settings of the consumer.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub max_messages: u32,
    pub wait_time_secs: u32,
    pub max_in_flight: usize,
    pub error_backoff: Duration,
}

impl From<&QueueConfig> for ConsumerSettings {
    fn from(config: &QueueConfig) -> Self {
        Self {
            max_messages: config.max_messages,
            wait_time_secs: config.wait_time_secs,
            max_in_flight: config.max_in_flight.max(1),
            error_backoff: config.error_backoff(),
        }
    }
}

/// Counts for one received batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub received: usize,
    pub acknowledged: usize,
    pub failed: usize,
}

/// Hands out acknowledgement turns of one batch in receipt order.
struct AckSequence {
    next: watch::Sender<usize>,
}

impl AckSequence {
    fn new() -> Self {
        let (next, _) = watch::channel(0);
        Self { next }
    }

    async fn wait_turn(&self, position: usize) {
        let mut next = self.next.subscribe();
        // The sender outlives every waiter, so this cannot fail.
        let _ = next.wait_for(|next| *next >= position).await;
    }

    /// Passes the turn on; a no-op unless `position` currently holds it.
    fn release(&self, position: usize) {
        self.next.send_if_modified(|next| {
            if *next == position {
                *next = position + 1;
                true
            } else {
                false
            }
        });
    }
}

/// Deletes one delivery once every earlier delivery of the batch is settled.
pub struct QueueAcknowledgement<'a> {
    queue: &'a dyn MessageQueue,
    receipt_handle: &'a str,
    sequence: &'a AckSequence,
    position: usize,
}

#[async_trait]
impl<'a> Acknowledgement for QueueAcknowledgement<'a> {
    async fn acknowledge(&self) -> Result<(), String> {
        self.sequence.wait_turn(self.position).await;
        let result = self.queue.delete(self.receipt_handle).await;
        self.sequence.release(self.position);
        result.map_err(|e| e.to_string())
    }
}

struct Worker {
    queue: Arc<dyn MessageQueue>,
    ingestor: Arc<EventIngestor>,
    settings: ConsumerSettings,
}

impl Worker {
    async fn receive(&self) -> Result<Vec<QueueMessage>, QueueError> {
        self.queue
            .receive(self.settings.max_messages, self.settings.wait_time_secs)
            .await
    }

    async fn process_batch(&self, messages: Vec<QueueMessage>) -> BatchSummary {
        let sequence = &AckSequence::new();
        let received = messages.len();

        let outcomes: Vec<MessageOutcome> = stream::iter(messages.into_iter().enumerate())
            .map(|(position, message)| async move {
                self.process_message(sequence, position, &message).await
            })
            .boxed()
            .buffered(self.settings.max_in_flight)
            .collect()
            .await;

        let acknowledged = outcomes
            .iter()
            .filter(|outcome| **outcome == MessageOutcome::Acknowledged)
            .count();

        BatchSummary {
            received,
            acknowledged,
            failed: received - acknowledged,
        }
    }

    async fn process_message(
        &self,
        sequence: &AckSequence,
        position: usize,
        message: &QueueMessage,
    ) -> MessageOutcome {
        let ack = QueueAcknowledgement {
            queue: self.queue.as_ref(),
            receipt_handle: &message.receipt_handle,
            sequence,
            position,
        };

        let outcome = async {
            let start = Instant::now();
            match self.ingestor.handle(&message.body, &ack).await {
                Ok(report) => {
                    debug!(
                        saved = report.saved.len(),
                        skipped = report.skipped,
                        elapsed_ms = start.elapsed().as_millis(),
                        "Message acknowledged"
                    );
                    MessageOutcome::Acknowledged
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        kind = e.kind().as_str(),
                        elapsed_ms = start.elapsed().as_millis(),
                        "Message left for redelivery"
                    );
                    MessageOutcome::Failed
                }
            }
        }
        .instrument(message_span(&message.message_id))
        .await;

        if outcome == MessageOutcome::Failed {
            // Later deliveries may still be waiting on this position.
            sequence.wait_turn(position).await;
            sequence.release(position);
        }

        record_queue_message(outcome);
        outcome
    }
}

/// Background consumer of the change-notification queue.
pub struct QueueConsumer {
    worker: Arc<Worker>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handle: Option<JoinHandle<()>>,
}

impl QueueConsumer {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        ingestor: Arc<EventIngestor>,
        settings: ConsumerSettings,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            worker: Arc::new(Worker {
                queue,
                ingestor,
                settings,
            }),
            shutdown_tx,
            shutdown_rx,
            handle: None,
        }
    }

    /// Receives and processes a single batch.
    pub async fn poll_once(&self) -> Result<BatchSummary, QueueError> {
        let messages = self.worker.receive().await?;
        Ok(self.worker.process_batch(messages).await)
    }

    /// Spawns the polling loop.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            warn!("Queue consumer already started");
            return;
        }

        let worker = Arc::clone(&self.worker);
        let mut shutdown_rx = self.shutdown_rx.clone();

        info!(
            max_messages = worker.settings.max_messages,
            wait_time_secs = worker.settings.wait_time_secs,
            max_in_flight = worker.settings.max_in_flight,
            "Starting queue consumer"
        );

        self.handle = Some(tokio::spawn(async move {
            loop {
                if *shutdown_rx.borrow() {
                    break;
                }

                // Shutdown interrupts the long poll but never a received batch.
                let received = tokio::select! {
                    result = worker.receive() => result,
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                };

                match received {
                    Ok(messages) if messages.is_empty() => {}
                    Ok(messages) => {
                        let summary = worker.process_batch(messages).await;
                        info!(
                            received = summary.received,
                            acknowledged = summary.acknowledged,
                            failed = summary.failed,
                            "Processed queue batch"
                        );
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to receive queue messages");
                        tokio::select! {
                            _ = tokio::time::sleep(worker.settings.error_backoff) => {}
                            _ = shutdown_rx.changed() => {}
                        }
                    }
                }
            }
            info!("Queue consumer stopped");
        }));
    }

    /// Signals the polling loop to stop after the current batch.
    pub fn shutdown(&self) {
        info!("Initiating queue consumer shutdown");
        let _ = self.shutdown_tx.send(true);
    }

    /// Waits for the polling loop to finish, giving up after `timeout`.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        let Some(handle) = self.handle else {
            return;
        };

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(())) => info!("Queue consumer shut down gracefully"),
            Ok(Err(e)) => warn!("Queue consumer task panicked: {}", e),
            Err(_) => warn!("Queue consumer shutdown timed out after {:?}", timeout),
        }
    }
}
