//! HTTP payment provider.
//!
//! Posts the order of each message as JSON to a configured endpoint and
//! classifies the response status:
//!
//! | Response            | Result                                 |
//! |---------------------|----------------------------------------|
//! | 2xx                 | success                                |
//! | 5xx                 | critical, moved to the failed store    |
//! | any other status    | retryable                              |
//! | no response         | retryable                              |

use crate::error::ProcessingError;
use crate::message::PaymentMessage;
use crate::processor::PaymentProcessor;
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;

/// The request never produced a response
pub const FAILED_REQUEST: &str = "failed to do a request to the provider";

/// The provider failed internally; retrying will not help
pub const PROVIDER_INTERNAL_ERROR: &str =
    "payment can't be processed due a provider internal error";

/// The provider declined or could not take the payment
pub const PAYMENT_FAILED: &str = "fail to process the payment";

/// Errors constructing a provider
#[derive(Debug, Error)]
pub enum ProviderSetupError {
    #[error("Invalid provider endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Payment provider reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpPaymentProvider {
    client: Client,
    endpoint: Url,
}

impl HttpPaymentProvider {
    /// Create a provider posting to `endpoint`, giving up on a request after
    /// `timeout`
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ProviderSetupError> {
        let endpoint = Url::parse(endpoint).map_err(|e| ProviderSetupError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PaymentProcessor for HttpPaymentProvider {
    async fn process(&self, message: &PaymentMessage) -> Result<(), ProcessingError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&message.order)
            .send()
            .await
            .map_err(|e| {
                warn!(
                    message_id = %message.id,
                    endpoint = %self.endpoint,
                    error = %e,
                    "Payment provider request failed"
                );
                ProcessingError::retryable(FAILED_REQUEST)
            })?;

        let status = response.status();
        debug!(message_id = %message.id, status = status.as_u16(), "Payment provider responded");

        if status.is_server_error() {
            return Err(ProcessingError::critical(PROVIDER_INTERNAL_ERROR));
        }

        if !status.is_success() {
            return Err(ProcessingError::retryable(PAYMENT_FAILED));
        }

        Ok(())
    }
}
