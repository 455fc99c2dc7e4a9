//! Payment processor capability.

use crate::error::ProcessingError;
use crate::message::PaymentMessage;
use async_trait::async_trait;

/// A provider that can execute the payment of one message.
///
/// Implementations return [`ProcessingError::critical`] when the message must
/// never be retried and any other error when queue redelivery should retry
/// it. Processors are shared between concurrent dispatch tasks.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn process(&self, message: &PaymentMessage) -> Result<(), ProcessingError>;
}

/// Built-in payment providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// HTTP provider that posts the order to a configured endpoint
    Example,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 1] = [ProviderKind::Example];

    /// Identifier messages use to select this provider
    pub fn id(&self) -> &'static str {
        match self {
            Self::Example => "Example",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
