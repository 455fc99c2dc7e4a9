//! Batch processing engine.
//!
//! One call to [`BatchProcessor::process_batch`] runs a full cycle: fetch a
//! batch from the queue adapter, dispatch every message to its provider on
//! its own task, resolve each outcome against the queue and collect exactly
//! one [`MessageResponse`] per fetched message.
//!
//! Resolution per message:
//!
//! | Processing result | Queue action      | Status                       |
//! |-------------------|-------------------|------------------------------|
//! | success           | delete            | `success` (`error` if the delete fails) |
//! | critical error    | move to failed    | `critical` (`error` if the move fails)  |
//! | retryable error   | none              | `error`                      |
//! | unknown provider  | none              | `error`                      |

use crate::adapter::MessageAdapter;
use crate::error::{EngineError, ProcessingError};
use crate::message::{MessageHandle, PaymentMessage};
use crate::registry::ProviderRegistry;
use crate::response::{BatchResponse, MessageResponse, MessageStatus};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

/// Drives fetch-process-resolve cycles
#[derive(Clone)]
pub struct BatchProcessor {
    registry: Arc<ProviderRegistry>,
    adapter: Arc<dyn MessageAdapter>,
}

impl BatchProcessor {
    pub fn new(registry: Arc<ProviderRegistry>, adapter: Arc<dyn MessageAdapter>) -> Self {
        Self { registry, adapter }
    }

    /// Process one batch.
    ///
    /// Only a failed fetch fails the call. Every per-message failure is
    /// reported in the returned response.
    pub async fn process_batch(&self) -> Result<BatchResponse, EngineError> {
        let messages = self.adapter.fetch_messages().await.map_err(|e| {
            error!(error = %e, transient = e.is_transient(), "Failed to fetch messages");
            EngineError::FetchFailed(e)
        })?;

        if messages.is_empty() {
            info!("No messages received");
            return Ok(BatchResponse::empty());
        }

        info!(
            count = messages.len(),
            providers = ?self.registry.names(),
            "Dispatching batch"
        );

        // Handles stay in fetch order so every response, including one for a
        // panicked task, is tied to its message
        let tasks: Vec<(MessageHandle, JoinHandle<MessageResponse>)> = messages
            .into_iter()
            .map(|message| {
                let id = message.id.clone();
                let processor = self.clone();
                let handle = tokio::spawn(async move { processor.resolve_message(message).await });
                (id, handle)
            })
            .collect();

        let mut responses = Vec::with_capacity(tasks.len());
        for (id, handle) in tasks {
            let response = match handle.await {
                Ok(response) => response,
                Err(e) => {
                    let reason = join_failure(e);
                    error!(message_id = %id, reason = %reason, "Message processing task failed");
                    MessageResponse::error(
                        id,
                        format!("message processing task failed: {}", reason),
                    )
                }
            };
            responses.push(response);
        }

        let response = BatchResponse::processed(responses);
        info!(
            success = response.count(MessageStatus::Success),
            error = response.count(MessageStatus::Error),
            critical = response.count(MessageStatus::Critical),
            "Messages processed"
        );
        Ok(response)
    }

    /// Process and resolve a single message
    pub async fn resolve_message(&self, message: PaymentMessage) -> MessageResponse {
        resolve(Arc::clone(&self.registry), Arc::clone(&self.adapter), message).await
    }
}

async fn resolve(
    registry: Arc<ProviderRegistry>,
    adapter: Arc<dyn MessageAdapter>,
    message: PaymentMessage,
) -> MessageResponse {
    let Some(processor) = registry.resolve(&message) else {
        let reason = format!(
            "provider {} not available to process this message",
            message.provider
        );
        warn!(message_id = %message.id, provider = %message.provider, "Provider not available");
        return MessageResponse::error(message.id, reason);
    };

    let response = match processor.process(&message).await {
        Ok(()) => match adapter.delete(&message.id).await {
            Ok(()) => MessageResponse::success(message.id.clone()),
            Err(e) => MessageResponse::error(message.id.clone(), e.to_string()),
        },
        Err(e) if e.is_critical() => resolve_critical(adapter.as_ref(), &message, e).await,
        Err(e) => MessageResponse::error(
            message.id.clone(),
            format!("failed to process the payment: {}", e),
        ),
    };

    match response.status {
        MessageStatus::Success => {
            info!(
                message_id = %message.id,
                provider = %message.provider,
                "Message processed successfully"
            )
        }
        _ => info!(
            message_id = %message.id,
            provider = %message.provider,
            status = ?response.status,
            error = response.error.as_deref().unwrap_or_default(),
            "Problem to process message"
        ),
    }

    response
}

async fn resolve_critical(
    adapter: &dyn MessageAdapter,
    message: &PaymentMessage,
    cause: ProcessingError,
) -> MessageResponse {
    match adapter.move_to_failed(message).await {
        Ok(()) => MessageResponse::critical(message.id.clone(), cause.message()),
        Err(e) => {
            let relocation = e.relocation();
            error!(
                message_id = %message.id,
                error = %e,
                relocation = ?relocation,
                "Failed to move message to the failed store"
            );
            MessageResponse::error(
                message.id.clone(),
                format!("problem to move the message to DLQ: {}", cause),
            )
            .with_relocation(relocation)
        }
    }
}

fn join_failure(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }

    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
