//! # Payflow Queue
//!
//! Queue runtime used by the payment processor to pull pending payment
//! messages, acknowledge them and relocate them to a failed-message store.
//!
//! This library provides:
//! - A provider-agnostic [`QueueProvider`] trait
//! - An AWS SQS provider speaking the SQS query API over HTTP
//! - An in-memory provider with visibility timeouts for tests and local runs
//!
//! ## Module Organization
//!
//! - [`error`] - Error types for all queue operations
//! - [`message`] - Queue identifiers and message structures
//! - [`provider`] - Provider types and configuration
//! - [`client`] - The provider trait and factory
//! - [`providers`] - Concrete provider implementations

pub mod client;
pub mod error;
pub mod message;
pub mod provider;
pub mod providers;

// Re-export commonly used types at crate root for convenience
pub use client::{QueueProvider, QueueProviderFactory};
pub use error::{ConfigurationError, QueueError, SerializationError, ValidationError};
pub use message::{MessageId, OutboundMessage, QueueUrl, ReceiptHandle, ReceivedMessage, Timestamp};
pub use provider::{AwsSqsConfig, InMemoryConfig, ProviderConfig, ProviderType};
pub use providers::{AwsSqsProvider, InMemoryProvider};
