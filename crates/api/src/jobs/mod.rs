//! Background workers.

mod queue_consumer;

pub use queue_consumer::{
    BatchSummary, ConsumerSettings, MessageQueue, QueueConsumer, QueueError, QueueMessage,
};
