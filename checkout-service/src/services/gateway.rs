//! Payment gateway seam.
//!
//! Order creation talks to the gateway only through [`PaymentGateway`], so
//! tests and alternative providers can stand in for Razorpay.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Payment gateway credentials not configured")]
    NotConfigured,

    #[error("Payment gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Payment gateway rejected request: {code} - {description}")]
    Rejected { code: String, description: String },

    #[error("Unexpected payment gateway response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Request to open a gateway order.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayOrderRequest {
    /// Amount in smallest currency unit (paise for INR).
    pub amount: u64,
    pub currency: String,
    pub receipt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<serde_json::Value>,
}

/// Gateway order as returned to us.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    pub status: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open an order for `request.amount`. Exactly one outbound call; no retries.
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder, GatewayError>;

    /// Public key the browser checkout widget is initialised with.
    fn key_id(&self) -> &str;
}
