use crate::config::StorefrontConfig;
use async_trait::async_trait;
use checkout_service::dtos::{
    CreateOrderRequest, CreateOrderResponse, OrderSummary, PincodeResponse, VerifyPaymentRequest,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use service_core::middleware::signature::{
    CLIENT_ID_HEADER, NONCE_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER, USER_ID_HEADER,
};
use service_core::utils::signature::SignedRequest;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CheckoutApiError {
    #[error("Checkout service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Checkout service returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Request signing failed: {0}")]
    Signing(String),
}

/// The calls the checkout page makes against checkout-service.
#[async_trait]
pub trait CheckoutApi: Send + Sync {
    async fn check_pincode(&self, pincode: &str) -> Result<PincodeResponse, CheckoutApiError>;

    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreateOrderResponse, CheckoutApiError>;

    async fn verify_payment(&self, request: &VerifyPaymentRequest) -> Result<(), CheckoutApiError>;

    /// The user's orders, newest first. Requires a signing secret.
    async fn order_history(&self, user_id: &str) -> Result<Vec<OrderSummary>, CheckoutApiError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

struct RequestSigner {
    client_id: String,
    secret: Secret<String>,
}

pub struct CheckoutClient {
    client: Client,
    base_url: String,
    signer: Option<RequestSigner>,
}

impl CheckoutClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CheckoutApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            signer: None,
        })
    }

    pub fn from_config(config: &StorefrontConfig) -> Result<Self, CheckoutApiError> {
        let client = Self::new(
            &config.checkout_url,
            Duration::from_secs(config.request_timeout_seconds),
        )?;
        if config.signing_secret.expose_secret().is_empty() {
            return Ok(client);
        }
        Ok(client.with_signing(&config.client_id, config.signing_secret.clone()))
    }

    /// Sign user-scoped calls as `client_id`.
    pub fn with_signing(mut self, client_id: &str, secret: Secret<String>) -> Self {
        self.signer = Some(RequestSigner {
            client_id: client_id.to_string(),
            secret,
        });
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the signature headers for a bodiless GET on behalf of `user_id`.
    fn signed_get(&self, path: &str, user_id: &str) -> Result<RequestBuilder, CheckoutApiError> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            CheckoutApiError::Signing("no signing secret configured".to_string())
        })?;

        let timestamp = chrono::Utc::now().timestamp();
        let nonce = Uuid::new_v4().to_string();
        let signature = SignedRequest {
            method: "GET",
            path,
            timestamp,
            nonce: &nonce,
            user_id,
            body: b"",
        }
        .sign(signer.secret.expose_secret())
        .map_err(|e| CheckoutApiError::Signing(e.to_string()))?;

        Ok(self
            .client
            .get(self.url(path))
            .header(CLIENT_ID_HEADER, signer.client_id.as_str())
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .header(NONCE_HEADER, nonce)
            .header(USER_ID_HEADER, user_id)
            .header(SIGNATURE_HEADER, signature))
    }

    async fn rejected(response: Response) -> CheckoutApiError {
        let status = response.status();
        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown").to_string());
        CheckoutApiError::Rejected {
            status: status.as_u16(),
            message,
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, CheckoutApiError> {
        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl CheckoutApi for CheckoutClient {
    async fn check_pincode(&self, pincode: &str) -> Result<PincodeResponse, CheckoutApiError> {
        let response = self
            .client
            .get(self.url("/pincode"))
            .query(&[("pincode", pincode)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach checkout service for pincode lookup: {}", e);
                e
            })?;

        // A malformed pincode is answered with 400 and the same body shape.
        if response.status() == StatusCode::BAD_REQUEST {
            return Ok(response.json::<PincodeResponse>().await?);
        }
        Self::parse(response).await
    }

    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreateOrderResponse, CheckoutApiError> {
        let response = self
            .client
            .post(self.url("/order/create"))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send create-order request: {}", e);
                e
            })?;

        Self::parse(response).await
    }

    async fn verify_payment(&self, request: &VerifyPaymentRequest) -> Result<(), CheckoutApiError> {
        let response = self
            .client
            .post(self.url("/payment/verify"))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send payment verification: {}", e);
                e
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::rejected(response).await)
        }
    }

    async fn order_history(&self, user_id: &str) -> Result<Vec<OrderSummary>, CheckoutApiError> {
        let response = self
            .signed_get("/orders", user_id)?
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch order history: {}", e);
                e
            })?;

        Self::parse(response).await
    }
}
