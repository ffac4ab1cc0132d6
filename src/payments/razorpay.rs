use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::RazorpayConfig;
use crate::error::{msg, AppError, Result};

type HmacSha256 = Hmac<Sha256>;

const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

/// Convert a major-unit amount (e.g. rupees) to minor units (paise).
///
/// Returns None when the scaled value does not fit in an i64; callers
/// should reject such amounts as out of range.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount.checked_mul(Decimal::ONE_HUNDRED)?.round().to_i64()
}

/// Correlation metadata attached to a payment link and echoed back verbatim
/// on webhook events. Razorpay note values must be strings, so the cart item
/// ids travel JSON-encoded inside a single note.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkNotes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_item_ids: Option<CartItemIds>,
}

/// Cart item ids as they appear in notes: a JSON-encoded string when written
/// by this service, with a plain array tolerated on the way back in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CartItemIds {
    Encoded(String),
    Plain(Vec<String>),
}

impl LinkNotes {
    pub fn new(uid: &str, cart_item_ids: &[String]) -> Result<Self> {
        Ok(Self {
            uid: Some(uid.to_string()),
            cart_item_ids: Some(CartItemIds::Encoded(serde_json::to_string(cart_item_ids)?)),
        })
    }

    /// Best-effort parse of a notes payload. Razorpay represents empty notes
    /// as `[]`, and note values are integrator-controlled, so each field is
    /// parsed independently and anything unusable decodes to its default.
    pub fn from_value(value: &serde_json::Value) -> Self {
        Self {
            uid: value.get("uid").and_then(|v| v.as_str()).map(str::to_string),
            cart_item_ids: value
                .get("cartItemIds")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
        }
    }

    /// Cart item ids carried in the notes. Absent or malformed ids decode to
    /// an empty list rather than an error: a bad note must not block
    /// settlement of the order itself.
    pub fn item_ids(&self) -> Vec<String> {
        match &self.cart_item_ids {
            Some(CartItemIds::Encoded(raw)) => serde_json::from_str(raw).unwrap_or_default(),
            Some(CartItemIds::Plain(ids)) => ids.clone(),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatePaymentLinkRequest {
    amount: i64,
    currency: String,
    accept_partial: bool,
    customer: LinkCustomer,
    notify: LinkNotify,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_method: Option<String>,
    notes: LinkNotes,
}

#[derive(Debug, Serialize)]
struct LinkCustomer {
    email: String,
}

#[derive(Debug, Serialize)]
struct LinkNotify {
    email: bool,
}

/// Subset of the Razorpay payment link resource the service uses.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentLink {
    pub id: String,
    pub short_url: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest {
    amount: i64,
    currency: String,
    receipt: String,
}

/// Razorpay order resource, relayed to the caller as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct RazorpayClient {
    client: Client,
    key_id: String,
    key_secret: String,
    webhook_secret: String,
}

impl RazorpayClient {
    pub fn new(config: &RazorpayConfig) -> Self {
        Self {
            client: Client::new(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            webhook_secret: config.webhook_secret.clone(),
        }
    }

    /// Create a hosted payment link for `amount` minor units.
    pub async fn create_payment_link(
        &self,
        amount: i64,
        currency: &str,
        customer_email: &str,
        notes: &LinkNotes,
        callback_url: Option<&str>,
    ) -> Result<PaymentLink> {
        let request = CreatePaymentLinkRequest {
            amount,
            currency: currency.to_string(),
            accept_partial: false,
            customer: LinkCustomer {
                email: customer_email.to_string(),
            },
            notify: LinkNotify { email: true },
            callback_url: callback_url.map(str::to_string),
            callback_method: callback_url.map(|_| "get".to_string()),
            notes: notes.clone(),
        };

        let response = self
            .client
            .post(format!("{}/payment_links", RAZORPAY_API_BASE))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Razorpay API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Razorpay API error: {}",
                error_text
            )));
        }

        let link: PaymentLink = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Razorpay response: {}", e)))?;

        Ok(link)
    }

    /// Create a bare provider order, for integrations that drive their own
    /// checkout UI instead of a hosted link.
    pub async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<ProviderOrder> {
        let request = CreateOrderRequest {
            amount,
            currency: currency.to_string(),
            receipt: receipt.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/orders", RAZORPAY_API_BASE))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Razorpay API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Razorpay API error: {}",
                error_text
            )));
        }

        let order: ProviderOrder = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Razorpay response: {}", e)))?;

        Ok(order)
    }

    /// Verify the `x-razorpay-signature` header against the exact raw bytes
    /// Razorpay delivered. Any re-serialization of the body would change the
    /// bytes and break verification.
    pub fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<bool> {
        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| AppError::Internal(msg::INVALID_WEBHOOK_SECRET.into()))?;
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        // Use constant-time comparison to prevent timing attacks.
        // An attacker could otherwise measure response times to progressively
        // discover the correct signature byte-by-byte.
        let expected_bytes = expected.as_bytes();
        let provided_bytes = signature.as_bytes();

        // Length check is not constant-time, but that's fine - signature length
        // is not secret (it's always 64 hex chars for SHA-256)
        if expected_bytes.len() != provided_bytes.len() {
            return Ok(false);
        }

        Ok(expected_bytes.ct_eq(provided_bytes).into())
    }
}

// ============ Webhook event envelope ============

/// Razorpay webhook envelope. Only the fields the settlement pipeline reads
/// are modelled; everything else in the event is ignored.
#[derive(Debug, Deserialize)]
pub struct RazorpayWebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub payment: Option<WebhookWrapper<PaymentEntity>>,
    #[serde(default)]
    pub payment_link: Option<WebhookWrapper<PaymentLinkEntity>>,
}

/// Razorpay nests every payload entity under an `entity` key.
#[derive(Debug, Deserialize)]
pub struct WebhookWrapper<T> {
    pub entity: T,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    /// Present on payment events raised for link-based checkouts
    #[serde(default)]
    pub payment_link_id: Option<String>,
    /// Echo of the notes set at link creation; shape is not guaranteed
    #[serde(default)]
    pub notes: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct PaymentLinkEntity {
    pub id: String,
    #[serde(default)]
    pub notes: serde_json::Value,
}
