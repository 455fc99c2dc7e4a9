//! In-memory queue provider implementation for testing and development.
//!
//! This module provides a fully functional in-memory queue implementation that:
//! - Keeps one FIFO buffer per queue URL, created on first use
//! - Hides received messages for a visibility timeout, after which they are
//!   redelivered with a fresh receipt handle
//! - Tracks the approximate receive count of every message
//! - Provides thread-safe concurrent access
//!
//! This provider is intended for:
//! - Unit and integration testing of queue consumers
//! - Local runs without cloud infrastructure

use crate::client::QueueProvider;
use crate::error::{QueueError, ValidationError};
use crate::message::{
    MessageId, OutboundMessage, QueueUrl, ReceiptHandle, ReceivedMessage, Timestamp,
};
use crate::provider::{InMemoryConfig, ProviderType};
use async_trait::async_trait;
use chrono::Duration;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

// ============================================================================
// Internal Storage Structures
// ============================================================================

/// Thread-safe storage for all queues
struct QueueStorage {
    queues: HashMap<QueueUrl, InMemoryQueue>,
    config: InMemoryConfig,
}

impl QueueStorage {
    fn new(config: InMemoryConfig) -> Self {
        Self {
            queues: HashMap::new(),
            config,
        }
    }

    /// Get or create a queue
    fn get_or_create_queue(&mut self, queue: &QueueUrl) -> &mut InMemoryQueue {
        self.queues.entry(queue.clone()).or_default()
    }
}

/// Internal queue state for a single queue
#[derive(Default)]
struct InMemoryQueue {
    /// Visible messages in delivery order
    messages: VecDeque<StoredMessage>,
    /// Received messages keyed by their current receipt handle
    in_flight: HashMap<String, InFlightMessage>,
    next_sequence: u64,
}

impl InMemoryQueue {
    /// Return in-flight messages whose visibility timeout has elapsed to the
    /// front of the queue, oldest first.
    fn release_expired(&mut self) {
        let now = Timestamp::now();
        let mut expired: Vec<InFlightMessage> = Vec::new();
        self.in_flight.retain(|_, flight| {
            if flight.visible_at <= now {
                expired.push(flight.clone());
                false
            } else {
                true
            }
        });

        expired.sort_by(|a, b| b.message.sequence.cmp(&a.message.sequence));
        for flight in expired {
            self.messages.push_front(flight.message);
        }
    }

    fn total_len(&self) -> usize {
        self.messages.len() + self.in_flight.len()
    }
}

/// A message stored in the queue with metadata
#[derive(Clone)]
struct StoredMessage {
    message_id: MessageId,
    body: String,
    attributes: HashMap<String, String>,
    /// Send order within the queue
    sequence: u64,
    receive_count: u32,
}

/// A message currently hidden from consumers
#[derive(Clone)]
struct InFlightMessage {
    message: StoredMessage,
    visible_at: Timestamp,
}

// ============================================================================
// InMemoryProvider
// ============================================================================

/// In-memory queue provider implementation
pub struct InMemoryProvider {
    storage: Arc<RwLock<QueueStorage>>,
}

impl InMemoryProvider {
    /// Create new in-memory provider with configuration
    pub fn new(config: InMemoryConfig) -> Self {
        Self {
            storage: Arc::new(RwLock::new(QueueStorage::new(config))),
        }
    }

    // A poisoned lock only means another task panicked mid-operation; the
    // queue maps are still structurally valid.
    fn read(&self) -> RwLockReadGuard<'_, QueueStorage> {
        self.storage.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, QueueStorage> {
        self.storage.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of messages currently visible in the queue
    pub fn queue_depth(&self, queue: &QueueUrl) -> usize {
        let mut storage = self.write();
        let q = storage.get_or_create_queue(queue);
        q.release_expired();
        q.messages.len()
    }

    /// Number of received messages that have not been deleted and are still hidden
    pub fn in_flight_count(&self, queue: &QueueUrl) -> usize {
        let mut storage = self.write();
        let q = storage.get_or_create_queue(queue);
        q.release_expired();
        q.in_flight.len()
    }

    /// Bodies of all messages held by the queue, visible ones first
    pub fn peek_bodies(&self, queue: &QueueUrl) -> Vec<String> {
        let storage = self.read();
        match storage.queues.get(queue) {
            Some(q) => q
                .messages
                .iter()
                .map(|m| m.body.clone())
                .chain(q.in_flight.values().map(|f| f.message.body.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Make every in-flight message visible again immediately, as if its
    /// visibility timeout had elapsed.
    pub fn expire_in_flight(&self, queue: &QueueUrl) {
        let mut storage = self.write();
        let q = storage.get_or_create_queue(queue);
        let now = Timestamp::now();
        for flight in q.in_flight.values_mut() {
            flight.visible_at = now.clone();
        }
        q.release_expired();
    }
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new(InMemoryConfig::default())
    }
}

#[async_trait]
impl QueueProvider for InMemoryProvider {
    async fn receive_messages(
        &self,
        queue: &QueueUrl,
        max_messages: u32,
        _wait_time: Duration,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let max = max_messages.clamp(1, self.max_batch_size()) as usize;

        let mut storage = self.write();
        let visibility_timeout = storage.config.visibility_timeout;
        let q = storage.get_or_create_queue(queue);
        q.release_expired();

        let now = Timestamp::now();
        let visible_at = Timestamp::from_datetime(now.as_datetime() + visibility_timeout);

        let mut received = Vec::new();
        while received.len() < max {
            let Some(mut stored) = q.messages.pop_front() else {
                break;
            };

            stored.receive_count += 1;
            let handle = uuid::Uuid::new_v4().to_string();
            let receipt_handle = ReceiptHandle::new(handle.clone())?;

            received.push(ReceivedMessage {
                message_id: stored.message_id.clone(),
                receipt_handle,
                body: stored.body.clone(),
                attributes: stored.attributes.clone(),
                receive_count: stored.receive_count,
                received_at: now.clone(),
            });

            q.in_flight.insert(
                handle,
                InFlightMessage {
                    message: stored,
                    visible_at: visible_at.clone(),
                },
            );
        }

        Ok(received)
    }

    async fn delete_message(
        &self,
        queue: &QueueUrl,
        receipt: &ReceiptHandle,
    ) -> Result<(), QueueError> {
        let mut storage = self.write();
        let q = storage.get_or_create_queue(queue);
        q.release_expired();

        match q.in_flight.remove(receipt.as_str()) {
            Some(_) => Ok(()),
            None => Err(QueueError::MessageNotFound {
                receipt: receipt.to_string(),
            }),
        }
    }

    async fn send_message(
        &self,
        queue: &QueueUrl,
        message: &OutboundMessage,
    ) -> Result<MessageId, QueueError> {
        let max_size = self.provider_type().max_message_size();
        if message.body.len() > max_size {
            return Err(QueueError::MessageTooLarge {
                size: message.body.len(),
                max_size,
            });
        }

        if queue.is_fifo() && message.group_id.is_none() {
            return Err(ValidationError::Required {
                field: "group_id".to_string(),
            }
            .into());
        }

        let mut storage = self.write();
        let max_queue_size = storage.config.max_queue_size;
        let q = storage.get_or_create_queue(queue);

        if q.total_len() >= max_queue_size {
            return Err(QueueError::ProviderError {
                provider: ProviderType::InMemory.to_string(),
                code: "QueueFull".to_string(),
                message: format!("queue {} holds {} messages", queue, max_queue_size),
            });
        }

        let message_id = MessageId::new();
        let sequence = q.next_sequence;
        q.next_sequence += 1;
        q.messages.push_back(StoredMessage {
            message_id: message_id.clone(),
            body: message.body.clone(),
            attributes: message.attributes.clone(),
            sequence,
            receive_count: 0,
        });

        Ok(message_id)
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::InMemory
    }
}
