//! Test utilities and fixtures for payhook integration tests

#![allow(dead_code)]

use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde_json::{json, Value};

// Re-export the main library crate
pub use payhook::config::RazorpayConfig;
pub use payhook::db::{init_db, queries, AppState};
pub use payhook::models::*;
pub use payhook::payments::{LinkNotes, RazorpayClient, RazorpayWebhookEvent};
pub use payhook::reconcile::{self, IgnoreReason, WebhookOutcome};

pub const TEST_WEBHOOK_SECRET: &str = "whk_test_secret";

pub fn test_razorpay_config() -> RazorpayConfig {
    RazorpayConfig {
        key_id: "rzp_test_key".to_string(),
        key_secret: "rzp_test_key_secret".to_string(),
        webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
    }
}

pub fn test_razorpay_client() -> RazorpayClient {
    RazorpayClient::new(&test_razorpay_config())
}

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// App state backed by an in-memory database. The pool is capped at one
/// connection so every request sees the same database.
pub fn create_test_app_state() -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        razorpay: test_razorpay_client(),
        currency: "INR".to_string(),
        callback_url: Some("http://localhost:5000/payment-done".to_string()),
    }
}

/// Create a Router with all endpoints
pub fn test_app(state: AppState) -> Router {
    payhook::handlers::router().with_state(state)
}

/// Create a pending test order tied to a payment link
pub fn create_test_order(
    conn: &Connection,
    owner_id: &str,
    payment_link_id: &str,
    amount: i64,
) -> Order {
    let input = CreateOrder {
        owner_id: owner_id.to_string(),
        items: vec![json!({ "name": "Test item", "qty": 1 })],
        shipping_address: json!({ "line1": "14 Test Lane", "city": "Pune" }),
        total_amount: Decimal::from(amount),
        currency: "INR".to_string(),
    };
    queries::create_order(conn, &input, payment_link_id).expect("Failed to create test order")
}

/// Put one cart item per id for the given owner
pub fn seed_cart_items(conn: &Connection, owner_id: &str, item_ids: &[&str]) {
    for item_id in item_ids {
        queries::put_cart_item(conn, owner_id, item_id, &json!({ "qty": 1 }))
            .expect("Failed to seed cart item");
    }
}

/// Cart item ids as they travel inside notes: a JSON-encoded string
pub fn encoded_ids(item_ids: &[&str]) -> String {
    serde_json::to_string(item_ids).unwrap()
}

/// A realistic `payment_link.paid` envelope, notes echoed on both entities
pub fn link_paid_event(
    uid: &str,
    payment_link_id: &str,
    payment_id: &str,
    item_ids: &[&str],
) -> Value {
    let notes = json!({ "uid": uid, "cartItemIds": encoded_ids(item_ids) });
    json!({
        "entity": "event",
        "account_id": "acc_TestAccount00001",
        "event": "payment_link.paid",
        "contains": ["payment_link", "payment"],
        "payload": {
            "payment_link": {
                "entity": {
                    "id": payment_link_id,
                    "amount": 50000,
                    "amount_paid": 50000,
                    "currency": "INR",
                    "status": "paid",
                    "notes": notes,
                }
            },
            "payment": {
                "entity": {
                    "id": payment_id,
                    "amount": 50000,
                    "currency": "INR",
                    "status": "captured",
                    "method": "upi",
                    "notes": notes,
                }
            }
        },
        "created_at": 1755800000
    })
}

/// A `payment.captured` envelope: no link entity, the id rides on the payment
pub fn payment_captured_event(
    uid: &str,
    payment_link_id: &str,
    payment_id: &str,
    item_ids: &[&str],
) -> Value {
    json!({
        "entity": "event",
        "account_id": "acc_TestAccount00001",
        "event": "payment.captured",
        "contains": ["payment"],
        "payload": {
            "payment": {
                "entity": {
                    "id": payment_id,
                    "amount": 50000,
                    "currency": "INR",
                    "status": "captured",
                    "method": "card",
                    "payment_link_id": payment_link_id,
                    "notes": { "uid": uid, "cartItemIds": encoded_ids(item_ids) },
                }
            }
        },
        "created_at": 1755800000
    })
}

/// Decode an envelope the way the webhook handler does
pub fn decode_event(value: &Value) -> RazorpayWebhookEvent {
    serde_json::from_value(value.clone()).expect("Envelope should decode")
}
