use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

use super::from_row::{query_all, query_one, CART_ITEM_COLS, ORDER_COLS};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

// ============ Orders ============

/// Create a pending order tied to a freshly issued payment link.
pub fn create_order(
    conn: &Connection,
    input: &CreateOrder,
    payment_link_id: &str,
) -> Result<Order> {
    let id = gen_id();
    let now = now();
    let items = serde_json::to_string(&input.items)?;
    let shipping_address = serde_json::to_string(&input.shipping_address)?;

    conn.execute(
        "INSERT INTO orders (id, owner_id, items, shipping_address, total_amount, currency, payment_link_id, payment_status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            &id,
            &input.owner_id,
            &items,
            &shipping_address,
            input.total_amount.to_string(),
            &input.currency,
            payment_link_id,
            PaymentStatus::Pending.as_ref(),
            now
        ],
    )?;

    Ok(Order {
        id,
        owner_id: input.owner_id.clone(),
        items: serde_json::Value::Array(input.items.clone()),
        shipping_address: input.shipping_address.clone(),
        total_amount: input.total_amount,
        currency: input.currency.clone(),
        payment_link_id: payment_link_id.to_string(),
        payment_status: PaymentStatus::Pending,
        payment_id: None,
        created_at: now,
        paid_at: None,
    })
}

pub fn get_order_by_id(conn: &Connection, id: &str) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLS),
        params![id],
    )
}

/// Find the order a webhook settles, by owner and payment link.
///
/// Link ids are expected to be unique per order, but duplicate rows can
/// appear if the provider ever re-issues an id. The newest order wins;
/// rowid breaks ties within the same second.
pub fn latest_order_for_payment_link(
    conn: &Connection,
    owner_id: &str,
    payment_link_id: &str,
) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM orders WHERE owner_id = ?1 AND payment_link_id = ?2
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
            ORDER_COLS
        ),
        params![owner_id, payment_link_id],
    )
}

pub fn list_orders_for_owner(conn: &Connection, owner_id: &str) -> Result<Vec<Order>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM orders WHERE owner_id = ?1 ORDER BY created_at DESC",
            ORDER_COLS
        ),
        params![owner_id],
    )
}

/// Flip an order from pending to paid, recording the settling payment.
///
/// The status guard in the WHERE clause makes this a compare-and-swap:
/// replayed webhooks (or two racing deliveries) find no pending row and
/// return false, leaving the original settlement untouched.
pub fn mark_order_paid(conn: &Connection, id: &str, payment_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE orders SET payment_status = ?1, payment_id = ?2, paid_at = ?3
         WHERE id = ?4 AND payment_status = ?5",
        params![
            PaymentStatus::Paid.as_ref(),
            payment_id,
            now(),
            id,
            PaymentStatus::Pending.as_ref()
        ],
    )?;
    Ok(affected > 0)
}

// ============ Cart Items ============

/// Insert or replace a cart item for a buyer.
pub fn put_cart_item(
    conn: &Connection,
    owner_id: &str,
    item_id: &str,
    data: &serde_json::Value,
) -> Result<CartItem> {
    let now = now();
    let data_str = serde_json::to_string(data)?;

    conn.execute(
        "INSERT OR REPLACE INTO cart_items (owner_id, item_id, data, added_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![owner_id, item_id, &data_str, now],
    )?;

    Ok(CartItem {
        owner_id: owner_id.to_string(),
        item_id: item_id.to_string(),
        data: data.clone(),
        added_at: now,
    })
}

pub fn get_cart_item(conn: &Connection, owner_id: &str, item_id: &str) -> Result<Option<CartItem>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM cart_items WHERE owner_id = ?1 AND item_id = ?2",
            CART_ITEM_COLS
        ),
        params![owner_id, item_id],
    )
}

/// Delete a cart item. Returns false if it was already gone, which is
/// normal when a webhook is replayed.
pub fn delete_cart_item(conn: &Connection, owner_id: &str, item_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "DELETE FROM cart_items WHERE owner_id = ?1 AND item_id = ?2",
        params![owner_id, item_id],
    )?;
    Ok(affected > 0)
}

pub fn list_cart_items(conn: &Connection, owner_id: &str) -> Result<Vec<CartItem>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM cart_items WHERE owner_id = ?1 ORDER BY added_at, item_id",
            CART_ITEM_COLS
        ),
        params![owner_id],
    )
}
