//! Error types for payment processing.
//!
//! [`ProcessingError`] is what providers return; its [`ErrorKind`] decides
//! whether a failed message stays in the queue for redelivery or is moved to
//! the failed store. The remaining types describe failures of the queue
//! boundary and of the batch as a whole.

use crate::response::Relocation;
use payflow_queue::QueueError;
use thiserror::Error;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

// ============================================================================
// Processing Errors
// ============================================================================

/// Classification of a provider failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Leave the message in the queue; it will be redelivered
    #[default]
    Retryable,
    /// Never retry; move the message to the failed store
    Critical,
}

/// Failure returned by a payment provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProcessingError {
    kind: ErrorKind,
    message: String,
}

impl ProcessingError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Failure that should be retried through queue redelivery
    pub fn retryable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Retryable, message)
    }

    /// Failure that must not be retried
    pub fn critical(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Critical, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_critical(&self) -> bool {
        self.kind == ErrorKind::Critical
    }
}

// ============================================================================
// Queue Boundary Errors
// ============================================================================

/// Errors converting between queue bodies and payment messages
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to unmarshal message body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to marshal message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Errors from the queue adapter's fetch and delete operations
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to receive messages: {0}")]
    Receive(#[source] QueueError),

    #[error("message {receipt} has an invalid body: {source}")]
    Decode {
        receipt: String,
        #[source]
        source: CodecError,
    },

    #[error("failed to delete messages from SQS: {0}")]
    Delete(#[source] QueueError),
}

impl AdapterError {
    /// Whether the failure came from the queue transport rather than the data
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Receive(e) | Self::Delete(e) => e.is_transient(),
            Self::Decode { .. } => false,
        }
    }
}

/// Failure to relocate a message to the failed store.
///
/// Each variant records how far the relocation got, and so where the
/// message now lives.
#[derive(Debug, Error)]
pub enum MoveToFailedError {
    /// Nothing was sent; the message is still only in the main queue
    #[error("{0}")]
    Encode(#[source] CodecError),

    /// The failed store rejected the message; it is still only in the main queue
    #[error("failed to send the message to the DLQ: {0}")]
    Send(#[source] QueueError),

    /// The message reached the failed store but is also still in the main queue
    #[error("failed to delete the message from the main queue: {0}")]
    RemoveFromSource(#[source] QueueError),
}

impl MoveToFailedError {
    /// Where the message ended up after the failed relocation
    pub fn relocation(&self) -> Relocation {
        match self {
            Self::Encode(_) | Self::Send(_) => Relocation::NotMoved,
            Self::RemoveFromSource(_) => Relocation::Duplicated,
        }
    }
}

// ============================================================================
// Engine Errors
// ============================================================================

/// Failures that abort a whole batch
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read messages from SQS")]
    FetchFailed(#[source] AdapterError),
}
