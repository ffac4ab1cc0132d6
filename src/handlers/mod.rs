mod checkout;
mod webhook;

pub use checkout::{create_order, create_payment_link};
pub use webhook::handle_razorpay_webhook;

use axum::{
    routing::{get, post},
    Router,
};
use serde::Serialize;

use crate::db::AppState;
use crate::extractors::Json;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/create-payment-link", post(create_payment_link))
        .route("/create-order", post(create_order))
        .route("/webhook", post(handle_razorpay_webhook))
}
