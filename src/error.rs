use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable error messages returned to API callers.
pub mod msg {
    pub const INVALID_AMOUNT: &str = "amount must be greater than zero";
    pub const AMOUNT_OUT_OF_RANGE: &str = "amount cannot be represented in paise";
    pub const MISSING_UID: &str = "uid is required";
    pub const EMPTY_CART: &str = "cartItemIds must not be empty";
    pub const MISSING_SIGNATURE: &str = "Missing x-razorpay-signature header";
    pub const INVALID_SIGNATURE: &str = "Invalid webhook signature";
    pub const INVALID_WEBHOOK_SECRET: &str = "Invalid webhook secret";
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Request validation failed, or a webhook could not be authenticated.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A Razorpay call failed or returned an unusable response.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A webhook body did not decode as the expected envelope.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Body shape of every error response: a stable generic `error` string,
/// with `details` present only where the caller can act on them.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Json(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::Database(_) | Self::Pool(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// What the caller is told. Server-side failures all collapse to a
    /// generic message; the real cause only goes to the log.
    fn public_parts(&self) -> (&'static str, Option<String>) {
        match self {
            Self::BadRequest(details) => ("Bad request", Some(details.clone())),
            Self::Json(e) => ("Invalid JSON", Some(e.to_string())),
            Self::Upstream(_) => ("Upstream service error", None),
            Self::Database(_) | Self::Pool(_) | Self::Internal(_) => {
                ("Internal server error", None)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::Upstream(_) | Self::Database(_) | Self::Pool(_) | Self::Internal(_) => {
                tracing::error!(error = %self, "request failed");
            }
            Self::Json(e) => tracing::warn!("Rejected unparseable body: {}", e),
            Self::BadRequest(_) => {}
        }

        let (error, details) = self.public_parts();
        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
