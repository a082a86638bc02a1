use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::dtos::{VerifyPaymentRequest, VerifyPaymentResponse};
use crate::utils::ValidatedJson;
use crate::AppState;

/// Confirm a completed gateway payment and settle the order.
///
/// POST /payment/verify
#[tracing::instrument(
    skip(state, payload),
    fields(order_id = %payload.order_id, gateway_order_id = %payload.gateway_order_id)
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, AppError> {
    state.payments.verify(&payload).await?;
    Ok(Json(VerifyPaymentResponse { success: true }))
}
