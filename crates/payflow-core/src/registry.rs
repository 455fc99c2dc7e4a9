//! Provider registry for payment dispatch.
//!
//! This module provides [`ProviderRegistry`] for associating provider
//! identifiers (e.g. `"Example"`) with their [`PaymentProcessor`]
//! implementations. The registry is built once at startup and used read-only
//! by every dispatch task, so it is shared behind an `Arc` without locking.
//!
//! Messages select their processor with the `provider` field of the body:
//!
//! ```text
//! {"provider": "Example", "order": {...}}
//! ```

use crate::config::ServiceConfig;
use crate::message::PaymentMessage;
use crate::processor::{PaymentProcessor, ProviderKind};
use crate::providers::{HttpPaymentProvider, ProviderSetupError};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tracing::info;

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

// ============================================================================
// ProviderId
// ============================================================================

/// Identifier of a payment provider.
///
/// Provider IDs are compared verbatim against the `provider` field of
/// incoming messages, so they are case-sensitive. They must not be empty and
/// must not contain whitespace or control characters.
///
/// # Examples
///
/// ```rust
/// use payflow_core::registry::ProviderId;
///
/// let id = ProviderId::new("Example").unwrap();
/// assert_eq!(id.as_str(), "Example");
///
/// assert!(ProviderId::new("").is_err());
/// assert!(ProviderId::new("two words").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderId(String);

impl ProviderId {
    /// Create a new `ProviderId`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidProviderIdError::Empty`] if the value is empty.
    /// Returns [`InvalidProviderIdError::InvalidChars`] if the value contains
    /// whitespace or control characters.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidProviderIdError> {
        let s = value.into();
        if s.is_empty() {
            return Err(InvalidProviderIdError::Empty);
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(InvalidProviderIdError::InvalidChars { value: s });
        }
        Ok(Self(s))
    }

    /// Return the provider ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<ProviderKind> for ProviderId {
    fn from(kind: ProviderKind) -> Self {
        Self(kind.id().to_string())
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error returned when a [`ProviderId`] cannot be created.
#[derive(Debug, Error)]
pub enum InvalidProviderIdError {
    /// Provider ID must not be empty.
    #[error("Provider ID must not be empty")]
    Empty,

    /// Provider ID contains whitespace or control characters.
    #[error("Provider ID '{value}' contains whitespace or control characters")]
    InvalidChars { value: String },
}

/// Errors building the startup registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to set up provider {provider}: {source}")]
    ProviderSetup {
        provider: ProviderKind,
        #[source]
        source: ProviderSetupError,
    },
}

// ============================================================================
// ProviderRegistry
// ============================================================================

/// Registry mapping provider IDs to their payment processors.
///
/// All values are stored as `Arc<dyn PaymentProcessor>` to allow sharing
/// across async tasks and threads.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    processors: HashMap<String, Arc<dyn PaymentProcessor>>,
}

impl ProviderRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }

    /// Build the registry of built-in providers from service configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        for kind in ProviderKind::ALL {
            let processor: Arc<dyn PaymentProcessor> = match kind {
                ProviderKind::Example => Arc::new(
                    HttpPaymentProvider::new(
                        &config.provider_example_request_uri,
                        config.request_timeout(),
                    )
                    .map_err(|source| RegistryError::ProviderSetup {
                        provider: kind,
                        source,
                    })?,
                ),
            };

            registry.register(ProviderId::from(kind), processor);
            info!(provider = %kind, "Registered payment provider");
        }

        Ok(registry)
    }

    /// Register a provider with its processor.
    ///
    /// If a provider with the same ID is already registered it is replaced.
    /// Returns `&mut Self` to allow method chaining.
    pub fn register(&mut self, id: ProviderId, processor: Arc<dyn PaymentProcessor>) -> &mut Self {
        self.processors.insert(id.0, processor);
        self
    }

    /// Find the processor for a message.
    ///
    /// Returns `None` if the message names a provider that is not registered.
    pub fn resolve(&self, message: &PaymentMessage) -> Option<Arc<dyn PaymentProcessor>> {
        self.get(&message.provider)
    }

    /// Look up a processor by provider name.
    pub fn get(&self, provider: &str) -> Option<Arc<dyn PaymentProcessor>> {
        self.processors.get(provider).cloned()
    }

    /// Registered provider IDs, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.processors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
