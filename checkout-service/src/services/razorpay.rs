//! Razorpay payment provider client.
//!
//! Implements Razorpay's Orders API for payment initiation and the
//! checkout signature scheme used to confirm payments.

use crate::config::RazorpayConfig;
use crate::services::gateway::{GatewayError, GatewayOrder, GatewayOrderRequest, PaymentGateway};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use service_core::utils::signature::{sign_hex, verify_hex};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Razorpay client for interacting with the Razorpay API.
#[derive(Clone)]
pub struct RazorpayClient {
    client: Client,
    config: RazorpayConfig,
}

/// Razorpay API error response.
#[derive(Debug, Deserialize)]
struct RazorpayError {
    error: RazorpayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetail {
    code: String,
    description: String,
}

/// Message signed by Razorpay: `order_id|payment_id`. The separator keeps
/// `("order_A", "pay_B")` and `("order_A_pay", "_B")` distinct.
fn signature_payload(gateway_order_id: &str, gateway_payment_id: &str) -> String {
    format!("{}|{}", gateway_order_id, gateway_payment_id)
}

/// `HMAC-SHA256(order_id + "|" + payment_id, secret)` as lowercase hex.
pub fn generate_signature(
    gateway_order_id: &str,
    gateway_payment_id: &str,
    secret: &str,
) -> anyhow::Result<String> {
    sign_hex(secret, &signature_payload(gateway_order_id, gateway_payment_id))
}

/// True only when `signature` is exactly the digest for this order/payment pair.
pub fn verify_signature(
    gateway_order_id: &str,
    gateway_payment_id: &str,
    signature: &str,
    secret: &str,
) -> anyhow::Result<bool> {
    verify_hex(
        secret,
        &signature_payload(gateway_order_id, gateway_payment_id),
        signature,
    )
}

impl RazorpayClient {
    /// Create a new Razorpay client.
    pub fn new(config: RazorpayConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Check if Razorpay is configured (credentials are set).
    pub fn is_configured(&self) -> bool {
        !self.config.key_id.is_empty() && self.config.has_secret()
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder, GatewayError> {
        if !self.is_configured() {
            return Err(GatewayError::NotConfigured);
        }

        let url = format!("{}/orders", self.config.api_base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, "Razorpay create_order response");

        if status.is_success() {
            let order: GatewayOrder = serde_json::from_str(&body)?;
            tracing::info!(
                gateway_order_id = %order.id,
                amount = order.amount,
                currency = %order.currency,
                "Razorpay order created"
            );
            Ok(order)
        } else {
            let (code, description) = match serde_json::from_str::<RazorpayError>(&body) {
                Ok(err) => (err.error.code, err.error.description),
                Err(_) => (status.as_str().to_string(), body),
            };
            tracing::error!(
                code = %code,
                description = %description,
                "Razorpay order creation failed"
            );
            Err(GatewayError::Rejected { code, description })
        }
    }

    fn key_id(&self) -> &str {
        &self.config.key_id
    }
}
