//! Provider trait and factory for queue operations.

use crate::error::QueueError;
use crate::message::{MessageId, OutboundMessage, QueueUrl, ReceiptHandle, ReceivedMessage};
use crate::provider::{ProviderConfig, ProviderType};
use crate::providers::{AwsSqsProvider, InMemoryProvider};
use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Interface implemented by specific queue providers (AWS SQS, in-memory)
///
/// Every operation must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait QueueProvider: Send + Sync {
    /// Receive up to `max_messages` messages, waiting at most `wait_time` for the first one
    async fn receive_messages(
        &self,
        queue: &QueueUrl,
        max_messages: u32,
        wait_time: Duration,
    ) -> Result<Vec<ReceivedMessage>, QueueError>;

    /// Remove a delivered message from the queue
    async fn delete_message(
        &self,
        queue: &QueueUrl,
        receipt: &ReceiptHandle,
    ) -> Result<(), QueueError>;

    /// Send single message
    async fn send_message(
        &self,
        queue: &QueueUrl,
        message: &OutboundMessage,
    ) -> Result<MessageId, QueueError>;

    /// Get provider type
    fn provider_type(&self) -> ProviderType;

    /// Get maximum receive batch size
    fn max_batch_size(&self) -> u32 {
        self.provider_type().max_batch_size()
    }
}

/// Factory for creating queue providers from configuration
pub struct QueueProviderFactory;

impl QueueProviderFactory {
    /// Create queue provider from configuration
    pub async fn create_provider(
        config: ProviderConfig,
    ) -> Result<Arc<dyn QueueProvider>, QueueError> {
        let provider: Arc<dyn QueueProvider> = match config {
            ProviderConfig::InMemory(in_memory_config) => {
                Arc::new(InMemoryProvider::new(in_memory_config))
            }
            ProviderConfig::AwsSqs(aws_config) => Arc::new(
                AwsSqsProvider::new(aws_config)
                    .await
                    .map_err(|e| e.to_queue_error())?,
            ),
        };

        tracing::debug!(provider = %provider.provider_type(), "Created queue provider");
        Ok(provider)
    }
}
