use axum::{body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;

use crate::db::AppState;
use crate::error::{msg, AppError, Result};
use crate::extractors::Json;
use crate::payments::RazorpayWebhookEvent;
use crate::reconcile::{self, WebhookOutcome};

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

/// Receive a Razorpay webhook: authenticate the raw bytes, decode the
/// envelope, then hand it to the settlement pipeline.
///
/// Signature and decode failures are the caller's problem and get a 400.
/// Everything past that point acknowledges with 200 so Razorpay stops
/// retrying; only a store failure is allowed to surface as a 500.
pub async fn handle_razorpay_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get("x-razorpay-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest(msg::MISSING_SIGNATURE.into()))?;

    if !state.razorpay.verify_webhook_signature(&body, signature)? {
        tracing::warn!("Rejected webhook with bad signature");
        return Err(AppError::BadRequest(msg::INVALID_SIGNATURE.into()));
    }

    let event: RazorpayWebhookEvent = serde_json::from_slice(&body)?;

    let conn = state.db.get()?;
    let outcome = reconcile::reconcile_event(&conn, &event)?;

    match &outcome {
        WebhookOutcome::Settled {
            order_id,
            payment_id,
        } => {
            tracing::info!("Settled order {} via payment {}", order_id, payment_id);
        }
        WebhookOutcome::AlreadySettled { order_id } => {
            tracing::info!("Replayed webhook for settled order {}", order_id);
        }
        WebhookOutcome::NoMatchingOrder => {
            tracing::warn!("No order matched {} webhook", event.event);
        }
        WebhookOutcome::Ignored(reason) => {
            tracing::debug!("Ignored {} webhook: {:?}", event.event, reason);
        }
    }

    Ok(Json(WebhookAck { status: "ok" }))
}
