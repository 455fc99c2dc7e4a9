//! Payment message model.
//!
//! A [`PaymentMessage`] is what the engine dispatches: the handle that
//! acknowledges the queue delivery, the identifier of the provider that
//! should execute the payment, and the order to pay for. The order is opaque
//! to the engine and only interpreted by providers.

use payflow_queue::{ReceiptHandle, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

// ============================================================================
// MessageHandle
// ============================================================================

/// Handle used to delete or relocate a message.
///
/// This is the queue delivery's receipt handle, not the business ID of the
/// order, and it is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageHandle(ReceiptHandle);

impl MessageHandle {
    /// Create a handle from a raw receipt string
    pub fn new(handle: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self(ReceiptHandle::new(handle)?))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The queue receipt this handle acknowledges
    pub fn receipt(&self) -> &ReceiptHandle {
        &self.0
    }
}

impl From<ReceiptHandle> for MessageHandle {
    fn from(receipt: ReceiptHandle) -> Self {
        Self(receipt)
    }
}

impl std::fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Payload
// ============================================================================

/// A pending payment pulled from the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMessage {
    pub id: MessageHandle,
    /// Registry key of the provider that processes this payment
    pub provider: String,
    #[serde(default)]
    pub order: Order,
}

impl PaymentMessage {
    pub fn new(id: MessageHandle, provider: impl Into<String>, order: Order) -> Self {
        Self {
            id,
            provider: provider.into(),
            order,
        }
    }
}

/// The purchased order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub payment_method: String,
    #[serde(
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "decimal_or_zero"
    )]
    pub shipping_amount: Decimal,
    #[serde(
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "decimal_or_zero"
    )]
    pub total: Decimal,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<OrderItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub billing_address: Address,
    #[serde(deserialize_with = "null_as_default")]
    pub shipping_address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
}

/// A single line of an order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderItem {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "decimal_or_zero"
    )]
    pub unit_price: Decimal,
}

/// A contact address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    #[serde(deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub street: String,
    #[serde(deserialize_with = "null_as_default")]
    pub number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub zip_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
}

/// The customer that purchased the order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub birthday: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gender: String,
}

/// Read an explicit `null` as the field's default, like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(rust_decimal::serde::float_option::deserialize(deserializer)?.unwrap_or_default())
}
