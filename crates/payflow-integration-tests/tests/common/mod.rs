//! Common test utilities for payflow integration tests
//!
//! This module provides:
//! - Queue URLs and message bodies for test batches
//! - A mocked payment provider endpoint
//! - Builders wiring the engine over an in-memory queue

use payflow_core::{BatchProcessor, ProviderRegistry, QueueMessageAdapter, ServiceConfig};
use payflow_queue::{InMemoryProvider, OutboundMessage, QueueProvider, QueueUrl};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CHARGE_PATH: &str = "/charge";

#[allow(dead_code)]
pub fn main_queue() -> QueueUrl {
    QueueUrl::new("http://localhost:4566/000000000000/payments").unwrap()
}

#[allow(dead_code)]
pub fn failed_queue() -> QueueUrl {
    QueueUrl::new("http://localhost:4566/000000000000/payments-dlq.fifo").unwrap()
}

/// Queue body for a payment of `order_id` handled by `provider`
pub fn payment_body(provider: &str, order_id: &str) -> String {
    serde_json::json!({
        "provider": provider,
        "order": {
            "id": order_id,
            "payment_method": "credit_card",
            "shipping_amount": 5,
            "total": 25,
            "items": [{"id": "item-1", "name": "Book", "unit_price": 20}],
            "billing_address": {"first_name": "Ana", "city": "Porto Alegre"},
            "shipping_address": {"first_name": "Ana", "city": "Porto Alegre"}
        }
    })
    .to_string()
}

/// Answer charges for `order_id` with `status`
pub async fn respond_to_order(server: &MockServer, order_id: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path(CHARGE_PATH))
        .and(body_partial_json(serde_json::json!({ "id": order_id })))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Service configuration pointing the built-in provider at `server`
pub fn config_for(server: &MockServer, max_messages: u32) -> ServiceConfig {
    ServiceConfig {
        sqs_queue_url: main_queue().to_string(),
        sqs_dlq_queue_url: failed_queue().to_string(),
        sqs_max_number_of_messages: max_messages,
        provider_example_request_uri: format!("{}{}", server.uri(), CHARGE_PATH),
        provider_request_timeout: 5,
        ..Default::default()
    }
}

/// Engine over an in-memory queue with the built-in providers
#[allow(dead_code)]
pub fn in_memory_processor(
    queue: Arc<InMemoryProvider>,
    config: &ServiceConfig,
) -> BatchProcessor {
    let adapter = QueueMessageAdapter::new(
        queue,
        main_queue(),
        failed_queue(),
        config.sqs_max_number_of_messages,
    );
    let registry = ProviderRegistry::from_config(config).unwrap();
    BatchProcessor::new(Arc::new(registry), Arc::new(adapter))
}

#[allow(dead_code)]
pub async fn enqueue(queue: &InMemoryProvider, body: &str) {
    queue
        .send_message(&main_queue(), &OutboundMessage::new(body))
        .await
        .unwrap();
}
