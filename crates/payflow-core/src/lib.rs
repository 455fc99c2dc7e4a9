//! # Payflow Core
//!
//! Queue-driven payment processing. A [`BatchProcessor`] pulls one batch of
//! payment messages through a [`MessageAdapter`], dispatches every message
//! concurrently to the [`PaymentProcessor`] registered for its provider, and
//! resolves each one against the queue:
//!
//! - success: the message is deleted
//! - retryable failure: the message stays in the queue for redelivery
//! - critical failure: the message is moved to the failed store
//!
//! ## Module Organization
//!
//! - [`message`] - Payment message and order model
//! - [`error`] - Processing, queue boundary and engine errors
//! - [`processor`] - The provider capability and built-in provider kinds
//! - [`registry`] - Provider lookup by identifier
//! - [`codec`] - Queue body encoding
//! - [`adapter`] - Queue adapter used by the engine
//! - [`engine`] - Batch processing
//! - [`response`] - Per-message and batch outcomes
//! - [`config`] - Service configuration
//! - [`providers`] - Built-in payment providers

pub mod adapter;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod message;
pub mod processor;
pub mod providers;
pub mod registry;
pub mod response;

pub use adapter::{MessageAdapter, QueueMessageAdapter};
pub use config::{ConfigError, LogFormat, ServiceConfig};
pub use engine::BatchProcessor;
pub use error::{
    AdapterError, CodecError, EngineError, ErrorKind, MoveToFailedError, ProcessingError,
};
pub use message::{Address, Customer, MessageHandle, Order, OrderItem, PaymentMessage};
pub use processor::{PaymentProcessor, ProviderKind};
pub use providers::HttpPaymentProvider;
pub use registry::{ProviderId, ProviderRegistry, RegistryError};
pub use response::{BatchResponse, MessageResponse, MessageStatus, Relocation};
