//! Webhook settlement pipeline.
//!
//! A verified, decoded Razorpay event flows through three stages: filter
//! (is this an event we settle on?), correlate (which buyer and order does
//! it refer to?), and settle (clear the cart, mark the order paid). Each
//! way out of the pipeline is a distinct [`WebhookOutcome`] so handlers and
//! tests can tell them apart, even though almost all of them acknowledge
//! with 200 to stop the provider from retrying.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::PaymentStatus;
use crate::payments::{LinkNotes, RazorpayWebhookEvent};

/// Event types that confirm payment and trigger settlement.
const SETTLEMENT_EVENTS: &[&str] = &["payment_link.paid", "payment.captured"];

/// Everything settlement needs, pulled out of an event envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation {
    /// Buyer id from the link notes (`uid`)
    pub owner_id: String,
    /// Cart item ids from the link notes; empty when absent or malformed
    pub cart_item_ids: Vec<String>,
    /// Payment link id, the sole correlation key to a stored order
    pub payment_link_id: String,
    /// Provider payment id, recorded on the order at settlement
    pub payment_id: String,
}

/// Terminal state of a webhook that passed authentication and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The order was pending and is now paid; its cart items are gone.
    Settled { order_id: String, payment_id: String },
    /// The order had already been settled; nothing was changed.
    AlreadySettled { order_id: String },
    /// Correlation was complete but no stored order matched it.
    NoMatchingOrder,
    /// The event does not apply to this service.
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not an event type that confirms payment
    UnhandledEventType,
    /// No payment entity, no usable notes, or no payment link id
    MissingCorrelation,
}

pub fn is_settlement_event(event: &str) -> bool {
    SETTLEMENT_EVENTS.contains(&event)
}

/// Pull the correlation record out of an event envelope, or None when any
/// required piece is missing. Missing pieces are an integration mismatch,
/// not an attack, so the caller acknowledges instead of erroring.
pub fn extract_correlation(event: &RazorpayWebhookEvent) -> Option<Correlation> {
    let payment = &event.payload.payment.as_ref()?.entity;
    let link = event.payload.payment_link.as_ref().map(|w| &w.entity);

    // payment_link.paid carries the link entity; payment.captured only has
    // the id echoed on the payment itself
    let payment_link_id = link
        .map(|l| l.id.clone())
        .or_else(|| payment.payment_link_id.clone())?;

    // Notes ride on both entities; prefer the payment's copy
    let mut notes = LinkNotes::from_value(&payment.notes);
    if notes.uid.is_none() {
        if let Some(link) = link {
            notes = LinkNotes::from_value(&link.notes);
        }
    }
    let owner_id = notes.uid.clone()?;

    Some(Correlation {
        owner_id,
        cart_item_ids: notes.item_ids(),
        payment_link_id,
        payment_id: payment.id.clone(),
    })
}

/// Run the full pipeline for a decoded event.
pub fn reconcile_event(conn: &Connection, event: &RazorpayWebhookEvent) -> Result<WebhookOutcome> {
    if !is_settlement_event(&event.event) {
        return Ok(WebhookOutcome::Ignored(IgnoreReason::UnhandledEventType));
    }

    let Some(correlation) = extract_correlation(event) else {
        return Ok(WebhookOutcome::Ignored(IgnoreReason::MissingCorrelation));
    };

    settle(conn, &correlation)
}

/// Apply a correlated settlement to the store.
///
/// Safe to run any number of times for the same payment: cart deletes are
/// no-ops once the items are gone, and the paid flip is guarded by a
/// compare-and-swap on the pending status.
pub fn settle(conn: &Connection, correlation: &Correlation) -> Result<WebhookOutcome> {
    let Some(order) = queries::latest_order_for_payment_link(
        conn,
        &correlation.owner_id,
        &correlation.payment_link_id,
    )?
    else {
        return Ok(WebhookOutcome::NoMatchingOrder);
    };

    if order.payment_status == PaymentStatus::Paid {
        return Ok(WebhookOutcome::AlreadySettled { order_id: order.id });
    }

    for item_id in &correlation.cart_item_ids {
        queries::delete_cart_item(conn, &correlation.owner_id, item_id)?;
    }

    if !queries::mark_order_paid(conn, &order.id, &correlation.payment_id)? {
        // A concurrent delivery won the swap between our read and update
        return Ok(WebhookOutcome::AlreadySettled { order_id: order.id });
    }

    Ok(WebhookOutcome::Settled {
        order_id: order.id,
        payment_id: correlation.payment_id.clone(),
    })
}
