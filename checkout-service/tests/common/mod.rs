#![allow(dead_code)]

use async_trait::async_trait;
use checkout_service::build_router;
use checkout_service::config::{
    AuthConfig, CheckoutConfig, OtpMode, RateLimitConfig, RazorpayConfig, SigningConfig,
};
use checkout_service::models::OrderStatus;
use checkout_service::services::{
    generate_signature, GatewayError, GatewayOrder, GatewayOrderRequest, InMemoryOrderStore,
    MockOtpAuthenticator, OrderStore, PaymentGateway,
};
use checkout_service::startup::build_state;
use secrecy::Secret;
use service_core::middleware::signature::{
    CLIENT_ID_HEADER, NONCE_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER, USER_ID_HEADER,
};
use service_core::utils::signature::SignedRequest;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TEST_KEY_ID: &str = "rzp_test_key";
pub const TEST_KEY_SECRET: &str = "test_key_secret";
pub const TEST_USER_ID: &str = "test-user";
pub const OTP_SEND_LIMIT: u32 = 3;
pub const TEST_CLIENT_ID: &str = "storefront";
pub const TEST_SIGNING_SECRET: &str = "test_signing_secret";

/// Gateway double that records every request and can be switched to fail.
#[derive(Default)]
pub struct StubGateway {
    calls: AtomicUsize,
    fail: AtomicBool,
    requests: Mutex<Vec<GatewayOrderRequest>>,
}

impl StubGateway {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn last_request(&self) -> Option<GatewayOrderRequest> {
        self.requests.lock().ok()?.last().cloned()
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_order(
        &self,
        request: &GatewayOrderRequest,
    ) -> Result<GatewayOrder, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                code: "SERVER_ERROR".into(),
                description: "gateway unavailable".into(),
            });
        }
        Ok(GatewayOrder {
            id: format!("order_test_{}", n),
            amount: request.amount,
            currency: request.currency.clone(),
            receipt: Some(request.receipt.clone()),
            status: "created".into(),
        })
    }

    fn key_id(&self) -> &str {
        TEST_KEY_ID
    }
}

pub fn test_config() -> CheckoutConfig {
    CheckoutConfig {
        common: service_core::config::Config::default(),
        database: None,
        razorpay: RazorpayConfig {
            key_id: TEST_KEY_ID.to_string(),
            key_secret: Secret::new(TEST_KEY_SECRET.to_string()),
            api_base_url: "http://127.0.0.1:9".to_string(),
            currency: "INR".to_string(),
        },
        auth: AuthConfig {
            otp_mode: OtpMode::Mock,
            supabase_url: String::new(),
            supabase_anon_key: Secret::new(String::new()),
        },
        rate_limit: RateLimitConfig {
            otp_send_attempts: OTP_SEND_LIMIT,
            otp_send_window_seconds: 3600,
        },
        signing: SigningConfig {
            client_id: TEST_CLIENT_ID.to_string(),
            secret: Secret::new(TEST_SIGNING_SECRET.to_string()),
        },
        service_name: "checkout-service-test".to_string(),
    }
}

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryOrderStore>,
    pub gateway: Arc<StubGateway>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    pub async fn spawn_with(config: CheckoutConfig) -> Self {
        let store = Arc::new(InMemoryOrderStore::new());
        let gateway = Arc::new(StubGateway::default());

        let state = build_state(
            config,
            gateway.clone(),
            store.clone(),
            Arc::new(MockOtpAuthenticator),
        )
        .expect("Failed to build test state");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(
                listener,
                build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .ok();
        });

        Self {
            address: format!("http://127.0.0.1:{}", port),
            store,
            gateway,
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// GET signed as the storefront would, on behalf of `user_id`.
    pub async fn signed_get(&self, path: &str, user_id: &str, secret: &str) -> reqwest::Response {
        let timestamp = chrono::Utc::now().timestamp();
        let nonce = uuid::Uuid::new_v4().to_string();
        let signature = SignedRequest {
            method: "GET",
            path,
            timestamp,
            nonce: &nonce,
            user_id,
            body: b"",
        }
        .sign(secret)
        .unwrap();

        self.client
            .get(self.url(path))
            .header(CLIENT_ID_HEADER, TEST_CLIENT_ID)
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .header(NONCE_HEADER, nonce)
            .header(USER_ID_HEADER, user_id)
            .header(SIGNATURE_HEADER, signature)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn orders_for(&self, user_id: &str) -> reqwest::Response {
        self.signed_get("/orders", user_id, TEST_SIGNING_SECRET).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn create_order(&self, body: &Value) -> reqwest::Response {
        self.post_json("/order/create", body).await
    }

    pub async fn verify_payment(&self, body: &Value) -> reqwest::Response {
        self.post_json("/payment/verify", body).await
    }

    pub async fn order_status(&self, order_id: &str) -> Option<OrderStatus> {
        self.store
            .find(order_id)
            .await
            .expect("Order store failed")
            .map(|order| order.status)
    }
}

/// 2 x "How to Find Guru" (5900) + 1 x "When Good Fortune Arises" (29900).
pub fn order_body(pincode: &str) -> Value {
    json!({
        "amount": 41700,
        "items": [
            { "book_id": "1", "title": "How to Find Guru", "price": 5900, "quantity": 2 },
            { "book_id": "8", "title": "When Good Fortune Arises", "price": 29900, "quantity": 1 }
        ],
        "shipping_name": "Radha Devi",
        "shipping_address": "12 Temple Road, New Delhi",
        "shipping_pincode": pincode,
        "user_id": TEST_USER_ID
    })
}

/// What the gateway's checkout widget hands back after a successful payment.
pub fn payment_callback(order_id: &str, gateway_order_id: &str, payment_id: &str) -> Value {
    json!({
        "order_id": order_id,
        "gateway_order_id": gateway_order_id,
        "gateway_payment_id": payment_id,
        "signature": generate_signature(gateway_order_id, payment_id, TEST_KEY_SECRET).unwrap(),
    })
}
