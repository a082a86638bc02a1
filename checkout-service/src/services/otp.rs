//! Phone OTP login.
//!
//! Authentication is a strategy chosen when the application is composed:
//! [`SupabaseOtpAuthenticator`] for real SMS delivery, or
//! [`MockOtpAuthenticator`] which accepts any six-digit code.

use crate::config::AuthConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const COUNTRY_CODE: &str = "+91";
const MOCK_USER_ID: &str = "mock-user-id";

/// Prefix a validated 10-digit national number with the country code.
pub fn international_phone(phone: &str) -> String {
    format!("{}{}", COUNTRY_CODE, phone)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid OTP code")]
    InvalidCode,

    #[error("Authentication provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Authentication provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Unexpected authentication provider response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCode => AppError::Unauthorized(anyhow::anyhow!("Invalid OTP code")),
            other => AppError::upstream("Authentication service is temporarily unavailable", other),
        }
    }
}

#[async_trait]
pub trait OtpAuthenticator: Send + Sync {
    /// Deliver a code to `phone` (E.164, e.g. `+919876543210`).
    async fn send_otp(&self, phone: &str) -> Result<(), AuthError>;

    async fn verify_otp(&self, phone: &str, code: &str) -> Result<AuthSession, AuthError>;
}

/// Local-development stand-in: nothing is sent, any 6-digit code verifies.
#[derive(Debug, Default, Clone)]
pub struct MockOtpAuthenticator;

#[async_trait]
impl OtpAuthenticator for MockOtpAuthenticator {
    async fn send_otp(&self, _phone: &str) -> Result<(), AuthError> {
        tracing::debug!("Mock OTP send; nothing delivered");
        Ok(())
    }

    async fn verify_otp(&self, _phone: &str, code: &str) -> Result<AuthSession, AuthError> {
        if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AuthError::InvalidCode);
        }

        Ok(AuthSession {
            user_id: MOCK_USER_ID.to_string(),
            access_token: "mock-access-token".to_string(),
            refresh_token: "mock-refresh-token".to_string(),
            expires_in: 3600,
        })
    }
}

#[derive(Clone)]
pub struct SupabaseOtpAuthenticator {
    client: Client,
    base_url: String,
    anon_key: Secret<String>,
}

#[derive(Deserialize)]
struct SupabaseSession {
    access_token: String,
    refresh_token: String,
    expires_in: u64,
    user: SupabaseUser,
}

#[derive(Deserialize)]
struct SupabaseUser {
    id: String,
}

#[derive(Deserialize)]
struct SupabaseError {
    #[serde(alias = "error_description", alias = "message")]
    msg: Option<String>,
}

impl SupabaseOtpAuthenticator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(StatusCode, String), AuthError> {
        let key = self.anon_key.expose_secret();
        let response = self
            .client
            .post(format!("{}/auth/v1/{}", self.base_url, path))
            .header("apikey", key)
            .bearer_auth(key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }

    fn provider_error(status: StatusCode, body: &str) -> AuthError {
        let message = serde_json::from_str::<SupabaseError>(body)
            .ok()
            .and_then(|e| e.msg)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        AuthError::Provider {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl OtpAuthenticator for SupabaseOtpAuthenticator {
    async fn send_otp(&self, phone: &str) -> Result<(), AuthError> {
        let (status, body) = self
            .post("otp", serde_json::json!({ "phone": phone }))
            .await?;

        if status.is_success() {
            tracing::info!("OTP sent");
            Ok(())
        } else {
            let err = Self::provider_error(status, &body);
            tracing::error!(error = %err, "Supabase OTP send failed");
            Err(err)
        }
    }

    async fn verify_otp(&self, phone: &str, code: &str) -> Result<AuthSession, AuthError> {
        let (status, body) = self
            .post(
                "verify",
                serde_json::json!({ "phone": phone, "token": code, "type": "sms" }),
            )
            .await?;

        if status.is_client_error() {
            tracing::warn!(status = %status, "OTP verification rejected");
            return Err(AuthError::InvalidCode);
        }
        if !status.is_success() {
            return Err(Self::provider_error(status, &body));
        }

        let session: SupabaseSession = serde_json::from_str(&body)?;
        Ok(AuthSession {
            user_id: session.user.id,
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_in: session.expires_in,
        })
    }
}
