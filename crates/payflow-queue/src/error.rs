//! Error types for queue operations.

use chrono::Duration;
use thiserror::Error;

/// Failure of a queue call, independent of the backing provider
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue {queue} does not exist")]
    QueueNotFound { queue: String },

    /// The receipt was already used or its visibility timeout ran out
    #[error("receipt handle {receipt} is unknown or expired")]
    MessageNotFound { receipt: String },

    #[error("queue request timed out after {duration}")]
    Timeout { duration: Duration },

    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("queue credentials rejected: {message}")]
    AuthenticationFailed { message: String },

    #[error("not permitted: {operation}")]
    PermissionDenied { operation: String },

    #[error("message body is {size} bytes, the limit is {max_size}")]
    MessageTooLarge { size: usize, max_size: usize },

    #[error("{provider} rejected the request ({code}): {message}")]
    ProviderError {
        provider: String,
        code: String,
        message: String,
    },

    #[error(transparent)]
    SerializationError(#[from] SerializationError),

    #[error(transparent)]
    ConfigurationError(#[from] ConfigurationError),

    #[error(transparent)]
    ValidationError(#[from] ValidationError),
}

impl QueueError {
    /// Whether repeating the same call later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::ConnectionFailed { .. } | Self::ProviderError { .. }
        )
    }
}

/// A provider response could not be read
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("malformed provider response: {message}")]
    Xml { message: String },
}

/// Provider settings that cannot be used
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("invalid queue configuration: {message}")]
    Invalid { message: String },
}

/// A value handed to the queue layer is unusable
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} is malformed: {message}")]
    InvalidFormat { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
