use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// A checkout order awaiting (or having received) payment confirmation.
///
/// Created when a payment link is issued and settled by the webhook that
/// reports the link as paid. The payment link id is the only correlation
/// handle between the two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Buyer identifier, carried through the payment link notes as `uid`
    pub owner_id: String,
    /// Snapshot of the purchased items (opaque to the service)
    pub items: serde_json::Value,
    /// Shipping address as supplied at checkout (opaque to the service)
    pub shipping_address: serde_json::Value,
    /// Order total in major currency units (e.g. rupees, not paise)
    pub total_amount: Decimal,
    pub currency: String,
    pub payment_link_id: String,
    pub payment_status: PaymentStatus,
    /// Provider payment id, set once the order is paid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub owner_id: String,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub shipping_address: serde_json::Value,
    pub total_amount: Decimal,
    pub currency: String,
}
