//! Conversion between queue message bodies and payment messages.
//!
//! Incoming bodies carry `{"provider": ..., "order": {...}}`. The handle of a
//! decoded message is always the delivery's receipt handle; an `id` present
//! in the body is ignored. Encoded messages, written to the failed store,
//! carry `{"id": ..., "provider": ..., "order": {...}}`.

use crate::error::CodecError;
use crate::message::{null_as_default, MessageHandle, Order, PaymentMessage};
use payflow_queue::ReceivedMessage;
use serde::Deserialize;

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;

#[derive(Deserialize)]
struct InboundBody {
    // A missing or null provider is reported per message as unavailable
    #[serde(default, deserialize_with = "null_as_default")]
    provider: String,
    #[serde(default, deserialize_with = "null_as_default")]
    order: Order,
}

/// Decode a received queue message
pub fn decode(received: &ReceivedMessage) -> Result<PaymentMessage, CodecError> {
    let body: InboundBody = serde_json::from_str(&received.body).map_err(CodecError::Decode)?;

    Ok(PaymentMessage {
        id: MessageHandle::from(received.receipt_handle.clone()),
        provider: body.provider,
        order: body.order,
    })
}

/// Encode a payment message for the failed store
pub fn encode(message: &PaymentMessage) -> Result<String, CodecError> {
    serde_json::to_string(message).map_err(CodecError::Encode)
}
