//! Response model returned to the invoking boundary.

use crate::message::MessageHandle;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;

/// Result text when the fetch returned no messages
pub const NO_MESSAGES_RESULT: &str = "No messages received";

/// Result text when at least one message was fetched
pub const PROCESSED_RESULT: &str = "Messages processed";

/// Terminal status of one message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Processed and deleted from the queue
    Success,
    /// Not resolved; the message is still in the queue
    Error,
    /// Moved to the failed store
    Critical,
}

/// Where a critical message ended up when its relocation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relocation {
    /// Still only in the main queue
    NotMoved,
    /// In the failed store and in the main queue
    Duplicated,
}

/// Outcome of a single message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: MessageHandle,
    pub status: MessageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relocation: Option<Relocation>,
}

impl MessageResponse {
    pub fn success(id: MessageHandle) -> Self {
        Self {
            id,
            status: MessageStatus::Success,
            error: None,
            relocation: None,
        }
    }

    pub fn error(id: MessageHandle, error: impl Into<String>) -> Self {
        Self {
            id,
            status: MessageStatus::Error,
            error: Some(error.into()),
            relocation: None,
        }
    }

    pub fn critical(id: MessageHandle, error: impl Into<String>) -> Self {
        Self {
            id,
            status: MessageStatus::Critical,
            error: Some(error.into()),
            relocation: None,
        }
    }

    pub fn with_relocation(mut self, relocation: Relocation) -> Self {
        self.relocation = Some(relocation);
        self
    }
}

/// Aggregate outcome of one fetch cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub result: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<MessageResponse>,
}

impl BatchResponse {
    /// Response for an empty fetch
    pub fn empty() -> Self {
        Self {
            result: NO_MESSAGES_RESULT.to_string(),
            messages: Vec::new(),
        }
    }

    /// Response for a processed batch, one entry per fetched message
    pub fn processed(messages: Vec<MessageResponse>) -> Self {
        Self {
            result: PROCESSED_RESULT.to_string(),
            messages,
        }
    }

    /// Number of messages with the given status
    pub fn count(&self, status: MessageStatus) -> usize {
        self.messages.iter().filter(|m| m.status == status).count()
    }

    /// Find the response for a message handle
    pub fn find(&self, id: &str) -> Option<&MessageResponse> {
        self.messages.iter().find(|m| m.id.as_str() == id)
    }
}
