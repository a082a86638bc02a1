//! Payment confirmation.
//!
//! The browser relays `{gateway_order_id, gateway_payment_id, signature}`
//! after the gateway's checkout completes. Only a signature produced with
//! our key secret, for the gateway order recorded on the internal order,
//! moves that order from `Pending` to `Paid`.

use crate::dtos::VerifyPaymentRequest;
use crate::services::metrics;
use crate::services::order_store::{OrderStore, PaymentTransition};
use crate::services::razorpay::verify_signature;
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;

const VERIFICATION_FAILED_MESSAGE: &str = "Payment verification failed";

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Payment key secret is not configured")]
    SecretUnavailable,

    /// Carries no detail about which check failed.
    #[error("Payment verification failed")]
    Rejected,

    #[error("Signature computation failed: {0:#}")]
    Signing(anyhow::Error),

    #[error("Order store error: {0:#}")]
    Store(anyhow::Error),
}

impl From<VerificationError> for AppError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::Rejected => AppError::PaymentVerificationFailed,
            VerificationError::SecretUnavailable => {
                AppError::upstream(VERIFICATION_FAILED_MESSAGE, VerificationError::SecretUnavailable)
            }
            VerificationError::Signing(source) | VerificationError::Store(source) => {
                AppError::upstream(VERIFICATION_FAILED_MESSAGE, source)
            }
        }
    }
}

#[derive(Clone)]
pub struct PaymentVerifier {
    key_secret: Secret<String>,
    store: Arc<dyn OrderStore>,
}

impl PaymentVerifier {
    pub fn new(key_secret: Secret<String>, store: Arc<dyn OrderStore>) -> Self {
        Self { key_secret, store }
    }

    /// Check the signature and settle the order. Settling an order that is
    /// already `Paid` is a successful no-op.
    pub async fn verify(&self, request: &VerifyPaymentRequest) -> Result<(), VerificationError> {
        let outcome = self.try_verify(request).await;
        let label = match &outcome {
            Ok(PaymentTransition::Marked) => "paid",
            Ok(_) => "already_settled",
            Err(VerificationError::Rejected) => "rejected",
            Err(_) => "error",
        };
        metrics::record_payment_verification(label);
        outcome.map(|_| ())
    }

    async fn try_verify(&self, request: &VerifyPaymentRequest) -> Result<PaymentTransition, VerificationError> {
        let secret = self.key_secret.expose_secret();
        if secret.is_empty() {
            return Err(VerificationError::SecretUnavailable);
        }

        let authentic = verify_signature(
            &request.gateway_order_id,
            &request.gateway_payment_id,
            &request.signature,
            secret,
        )
        .map_err(VerificationError::Signing)?;

        if !authentic {
            tracing::warn!(
                order_id = %request.order_id,
                gateway_order_id = %request.gateway_order_id,
                "Payment signature mismatch"
            );
            return Err(VerificationError::Rejected);
        }

        let Some(order) = self
            .store
            .find(&request.order_id)
            .await
            .map_err(VerificationError::Store)?
        else {
            tracing::warn!(order_id = %request.order_id, "Verified payment for unknown order");
            return Err(VerificationError::Rejected);
        };

        if order.gateway_order_id != request.gateway_order_id {
            tracing::warn!(
                order_id = %order.id,
                expected_gateway_order_id = %order.gateway_order_id,
                received_gateway_order_id = %request.gateway_order_id,
                "Gateway order does not belong to this order"
            );
            return Err(VerificationError::Rejected);
        }

        let transition = self
            .store
            .mark_paid(&order.id, &request.gateway_payment_id)
            .await
            .map_err(VerificationError::Store)?;

        match &transition {
            PaymentTransition::Marked => tracing::info!(
                order_id = %order.id,
                gateway_payment_id = %request.gateway_payment_id,
                "Order paid"
            ),
            PaymentTransition::AlreadySettled(status) => tracing::info!(
                order_id = %order.id,
                status = status.as_str(),
                "Order already settled; verification is a no-op"
            ),
            PaymentTransition::NotFound => {
                tracing::warn!(order_id = %order.id, "Order disappeared before settlement");
                return Err(VerificationError::Rejected);
            }
        }

        Ok(transition)
    }
}
