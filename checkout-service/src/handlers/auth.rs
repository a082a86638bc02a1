//! Phone OTP login endpoints.

use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::dtos::{SendOtpRequest, SendOtpResponse, VerifyOtpRequest};
use crate::services::otp::{international_phone, AuthSession};
use crate::utils::{validate_phone_number, ValidatedJson};
use crate::AppState;

/// POST /auth/otp/send
pub async fn send_otp(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, AppError> {
    validate_phone_number(&payload.phone).into_app_result("Invalid phone number")?;

    state
        .authenticator
        .send_otp(&international_phone(&payload.phone))
        .await?;

    Ok(Json(SendOtpResponse { success: true }))
}

/// POST /auth/otp/verify
pub async fn verify_otp(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<VerifyOtpRequest>,
) -> Result<Json<AuthSession>, AppError> {
    validate_phone_number(&payload.phone).into_app_result("Invalid phone number")?;

    let session = state
        .authenticator
        .verify_otp(&international_phone(&payload.phone), payload.code.trim())
        .await?;

    tracing::info!(user_id = %session.user_id, "OTP login succeeded");
    Ok(Json(session))
}
