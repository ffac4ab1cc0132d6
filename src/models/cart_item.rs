use serde::{Deserialize, Serialize};

/// A single item in a buyer's cart, keyed by `(owner_id, item_id)`.
///
/// Cart items are removed when the order that references them settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub owner_id: String,
    pub item_id: String,
    /// Item payload (name, quantity, price, ...) - opaque to the service
    pub data: serde_json::Value,
    pub added_at: i64,
}
