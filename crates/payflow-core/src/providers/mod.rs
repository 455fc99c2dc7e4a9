//! Built-in payment provider implementations.

pub mod http;

pub use http::{HttpPaymentProvider, ProviderSetupError};
