use axum::extract::State;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::Json;
use crate::models::CreateOrder;
use crate::payments::{to_minor_units, LinkNotes, ProviderOrder};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentLinkRequest {
    /// Order total in major currency units (rupees)
    pub amount: Decimal,
    /// Buyer email, passed to Razorpay for payment notifications
    pub email: String,
    /// Buyer identifier; travels through the link notes and back on the webhook
    pub uid: String,
    /// Cart items to clear once payment is confirmed
    #[serde(default)]
    pub cart_item_ids: Vec<String>,
    /// Shipping address, stored verbatim on the order
    #[serde(default)]
    pub address: serde_json::Value,
    /// Purchased items, stored verbatim on the order
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct CreatePaymentLinkResponse {
    pub url: String,
}

/// Issue a hosted payment link and record the pending order it should
/// settle. Validation failures reject the request before anything is
/// created on either side.
pub async fn create_payment_link(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentLinkRequest>,
) -> Result<Json<CreatePaymentLinkResponse>> {
    if request.amount <= Decimal::ZERO {
        return Err(AppError::BadRequest(msg::INVALID_AMOUNT.into()));
    }
    if request.uid.trim().is_empty() {
        return Err(AppError::BadRequest(msg::MISSING_UID.into()));
    }
    if request.cart_item_ids.is_empty() {
        return Err(AppError::BadRequest(msg::EMPTY_CART.into()));
    }

    let amount = to_minor_units(request.amount)
        .ok_or_else(|| AppError::BadRequest(msg::AMOUNT_OUT_OF_RANGE.into()))?;

    let notes = LinkNotes::new(&request.uid, &request.cart_item_ids)?;
    let link = state
        .razorpay
        .create_payment_link(
            amount,
            &state.currency,
            &request.email,
            &notes,
            state.callback_url.as_deref(),
        )
        .await?;

    let conn = state.db.get()?;
    let order = queries::create_order(
        &conn,
        &CreateOrder {
            owner_id: request.uid.clone(),
            items: request.items.clone(),
            shipping_address: request.address.clone(),
            total_amount: request.amount,
            currency: state.currency.clone(),
        },
        &link.id,
    )?;

    tracing::info!(
        "Issued payment link {} for order {} (owner {})",
        link.id,
        order.id,
        order.owner_id
    );

    Ok(Json(CreatePaymentLinkResponse {
        url: link.short_url,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Order total in major currency units (rupees)
    pub amount: Decimal,
    /// Receipt reference; generated when the caller does not supply one
    #[serde(default)]
    pub receipt: Option<String>,
}

/// Create a bare Razorpay order and relay it to the caller. No local state
/// is written; callers running their own checkout UI correlate the result
/// themselves.
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<ProviderOrder>> {
    if request.amount <= Decimal::ZERO {
        return Err(AppError::BadRequest(msg::INVALID_AMOUNT.into()));
    }

    let amount = to_minor_units(request.amount)
        .ok_or_else(|| AppError::BadRequest(msg::AMOUNT_OUT_OF_RANGE.into()))?;

    let receipt = request
        .receipt
        .clone()
        .unwrap_or_else(|| format!("order_rcpt_{}", Uuid::new_v4().as_simple()));

    let order = state
        .razorpay
        .create_order(amount, &state.currency, &receipt)
        .await?;

    tracing::info!("Created provider order {} (receipt {})", order.id, receipt);

    Ok(Json(order))
}
