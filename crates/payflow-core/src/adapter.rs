//! Queue adapter used by the processing engine.
//!
//! [`MessageAdapter`] is the boundary between the engine and the backing
//! queue. [`QueueMessageAdapter`] implements it on top of any
//! [`QueueProvider`], with one main queue holding pending payments and one
//! failed store for messages that must not be retried.

use crate::codec;
use crate::error::{AdapterError, MoveToFailedError};
use crate::message::{MessageHandle, PaymentMessage};
use async_trait::async_trait;
use chrono::Duration;
use payflow_queue::{OutboundMessage, QueueProvider, QueueUrl};
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;

/// Queue operations the engine needs.
///
/// `delete` and `move_to_failed` are called concurrently from dispatch tasks.
#[async_trait]
pub trait MessageAdapter: Send + Sync {
    /// Fetch one batch of pending messages.
    ///
    /// Decoding is all-or-nothing: one malformed body fails the whole fetch.
    async fn fetch_messages(&self) -> Result<Vec<PaymentMessage>, AdapterError>;

    /// Acknowledge a message, removing it from the main queue
    async fn delete(&self, id: &MessageHandle) -> Result<(), AdapterError>;

    /// Copy a message to the failed store, then remove it from the main queue
    async fn move_to_failed(&self, message: &PaymentMessage) -> Result<(), MoveToFailedError>;
}

/// [`MessageAdapter`] over a queue provider
pub struct QueueMessageAdapter {
    provider: Arc<dyn QueueProvider>,
    queue: QueueUrl,
    failed_queue: QueueUrl,
    max_messages: u32,
}

impl QueueMessageAdapter {
    pub fn new(
        provider: Arc<dyn QueueProvider>,
        queue: QueueUrl,
        failed_queue: QueueUrl,
        max_messages: u32,
    ) -> Self {
        Self {
            provider,
            queue,
            failed_queue,
            max_messages,
        }
    }
}

#[async_trait]
impl MessageAdapter for QueueMessageAdapter {
    async fn fetch_messages(&self) -> Result<Vec<PaymentMessage>, AdapterError> {
        // No long polling; each invocation makes a single round trip
        let received = self
            .provider
            .receive_messages(&self.queue, self.max_messages, Duration::zero())
            .await
            .map_err(AdapterError::Receive)?;

        let messages = received
            .iter()
            .map(|r| {
                codec::decode(r).map_err(|source| AdapterError::Decode {
                    receipt: r.receipt_handle.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(queue = %self.queue, count = messages.len(), "Fetched payment messages");
        Ok(messages)
    }

    async fn delete(&self, id: &MessageHandle) -> Result<(), AdapterError> {
        self.provider
            .delete_message(&self.queue, id.receipt())
            .await
            .map_err(AdapterError::Delete)
    }

    async fn move_to_failed(&self, message: &PaymentMessage) -> Result<(), MoveToFailedError> {
        let body = codec::encode(message).map_err(MoveToFailedError::Encode)?;

        // A fresh group per message keeps FIFO failed stores from blocking on
        // one another
        let dedup = uuid::Uuid::new_v4().to_string();
        let outbound = OutboundMessage::new(body)
            .with_group_id(dedup.clone())
            .with_deduplication_id(dedup);

        let failed_id = self
            .provider
            .send_message(&self.failed_queue, &outbound)
            .await
            .map_err(MoveToFailedError::Send)?;

        self.provider
            .delete_message(&self.queue, message.id.receipt())
            .await
            .map_err(MoveToFailedError::RemoveFromSource)?;

        info!(
            message_id = %message.id,
            failed_message_id = %failed_id,
            failed_queue = %self.failed_queue,
            "Moved message to failed store"
        );
        Ok(())
    }
}
