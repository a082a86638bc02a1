use crate::error::AppError;
use crate::utils::signature::SignedRequest;
use async_trait::async_trait;
use axum::{
    body::{self, Body},
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const TIMESTAMP_HEADER: &str = "x-timestamp";
pub const NONCE_HEADER: &str = "x-nonce";
pub const SIGNATURE_HEADER: &str = "x-signature";
/// User the signing client acts for. Part of the signed payload.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Allowed drift between the caller's `X-Timestamp` and our clock.
pub const MAX_CLOCK_SKEW_SECONDS: i64 = 60;

const MAX_SIGNED_BODY_BYTES: usize = 1024 * 1024;

#[async_trait]
pub trait SignatureStore: Send + Sync {
    /// `true` the first time a nonce is presented, `false` on replay.
    async fn validate_nonce(&self, nonce: &str) -> Result<bool, AppError>;
    async fn get_signing_secret(&self, client_id: &str) -> Result<Option<String>, AppError>;
}

/// Admit only requests HMAC-signed by a known client.
///
/// The nonce is spent after the signature checks out, so a forged request
/// cannot burn a legitimate caller's nonce.
pub async fn signature_validation_middleware<S>(
    State(store): State<S>,
    req: Request,
    next: Next,
) -> Result<Response, AppError>
where
    S: SignatureStore + Clone + Send + Sync + 'static,
{
    let headers = req.headers();
    let client_id = get_header(headers, CLIENT_ID_HEADER)?;
    let timestamp = get_header(headers, TIMESTAMP_HEADER)?;
    let nonce = get_header(headers, NONCE_HEADER)?;
    let signature = get_header(headers, SIGNATURE_HEADER)?;
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let timestamp: i64 = timestamp
        .parse()
        .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid timestamp format")))?;

    let now = chrono::Utc::now().timestamp();
    if (now - timestamp).abs() > MAX_CLOCK_SKEW_SECONDS {
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Request timestamp expired"
        )));
    }

    let secret = store
        .get_signing_secret(&client_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Invalid Client ID")))?;

    let (parts, body) = req.into_parts();
    let bytes = body::to_bytes(body, MAX_SIGNED_BODY_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(format!("Unable to read request body: {}", e)))?;

    let signed = SignedRequest {
        method: parts.method.as_str(),
        path: parts.uri.path(),
        timestamp,
        nonce: &nonce,
        user_id: &user_id,
        body: &bytes,
    };
    let is_valid = signed.verify(&secret, &signature).map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("Signature verification error: {}", e))
    })?;

    if !is_valid {
        tracing::warn!(client_id = %client_id, path = %parts.uri.path(), "Invalid request signature");
        return Err(AppError::Unauthorized(anyhow::anyhow!("Invalid signature")));
    }

    if !store.validate_nonce(&nonce).await? {
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Replay detected (nonce used)"
        )));
    }

    let req = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(req).await)
}

fn get_header(headers: &HeaderMap, key: &str) -> Result<String, AppError> {
    headers
        .get(key)
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing header: {}", key)))?
        .to_str()
        .map(|s| s.to_string())
        .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid header format: {}", key)))
}
