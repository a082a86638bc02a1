#![allow(dead_code)]

use async_trait::async_trait;
use checkout_service::build_router;
use checkout_service::config::{
    AuthConfig, CheckoutConfig, OtpMode, RateLimitConfig, RazorpayConfig, SigningConfig,
};
use checkout_service::models::{Book, Order};
use checkout_service::services::{
    generate_signature, BookCatalog, GatewayError, GatewayOrder, GatewayOrderRequest,
    InMemoryOrderStore, MockOtpAuthenticator, OrderStore, PaymentGateway, StaticCatalog,
};
use checkout_service::startup::build_state;
use secrecy::Secret;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storefront::checkout::{ModalUnavailable, PaymentModal, PaymentOutcome, PaymentRequest};
use storefront::services::CheckoutClient;

pub const TEST_KEY_ID: &str = "rzp_test_storefront";
pub const TEST_KEY_SECRET: &str = "storefront_test_secret";
pub const TEST_USER_ID: &str = "storefront-user";
pub const TEST_CLIENT_ID: &str = "storefront";
pub const TEST_SIGNING_SECRET: &str = "storefront_signing_secret";

#[derive(Default)]
pub struct StubGateway {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl StubGateway {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_order(
        &self,
        request: &GatewayOrderRequest,
    ) -> Result<GatewayOrder, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                code: "SERVER_ERROR".into(),
                description: "gateway unavailable".into(),
            });
        }
        Ok(GatewayOrder {
            id: format!("order_sf_{}", n),
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

fn checkout_config() -> CheckoutConfig {
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
            otp_send_attempts: 5,
            otp_send_window_seconds: 900,
        },
        signing: SigningConfig {
            client_id: TEST_CLIENT_ID.to_string(),
            secret: Secret::new(TEST_SIGNING_SECRET.to_string()),
        },
        service_name: "checkout-service-storefront-test".to_string(),
    }
}

/// A checkout-service instance on a random local port.
pub struct TestCheckout {
    pub address: String,
    pub store: Arc<InMemoryOrderStore>,
    pub gateway: Arc<StubGateway>,
}

impl TestCheckout {
    pub async fn spawn() -> Self {
        let store = Arc::new(InMemoryOrderStore::new());
        let gateway = Arc::new(StubGateway::default());

        let state = build_state(
            checkout_config(),
            gateway.clone(),
            store.clone(),
            Arc::new(MockOtpAuthenticator),
        )
        .expect("Failed to build checkout state");

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
        }
    }

    /// Client signing with the secret this instance trusts.
    pub fn client(&self) -> CheckoutClient {
        self.unsigned_client()
            .with_signing(TEST_CLIENT_ID, Secret::new(TEST_SIGNING_SECRET.to_string()))
    }

    pub fn unsigned_client(&self) -> CheckoutClient {
        CheckoutClient::new(&self.address, Duration::from_secs(5))
            .expect("Failed to build checkout client")
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.store
            .list_for_user(TEST_USER_ID)
            .await
            .expect("Order store failed")
    }
}

pub async fn catalog_book(id: &str) -> Book {
    StaticCatalog::seeded()
        .find(id)
        .await
        .expect("Catalog lookup failed")
        .expect("Book not in catalog")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalBehaviour {
    Pay,
    PayWithForgedSignature,
    Dismiss,
    FailToLoad,
}

/// Stands in for the gateway's browser widget. A successful payment is
/// signed with the key secret the checkout-service under test trusts.
pub struct ScriptedModal {
    behaviour: Mutex<ModalBehaviour>,
    payments: AtomicUsize,
    opened: Mutex<Vec<PaymentRequest>>,
}

impl ScriptedModal {
    pub fn new(behaviour: ModalBehaviour) -> Self {
        Self {
            behaviour: Mutex::new(behaviour),
            payments: AtomicUsize::new(0),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn set(&self, behaviour: ModalBehaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    pub fn opened(&self) -> Vec<PaymentRequest> {
        self.opened.lock().unwrap().clone()
    }

    fn behaviour(&self) -> ModalBehaviour {
        *self.behaviour.lock().unwrap()
    }
}

#[async_trait]
impl PaymentModal for ScriptedModal {
    async fn load(&self) -> Result<(), ModalUnavailable> {
        match self.behaviour() {
            ModalBehaviour::FailToLoad => Err(ModalUnavailable),
            _ => Ok(()),
        }
    }

    async fn open(&self, request: &PaymentRequest) -> PaymentOutcome {
        self.opened.lock().unwrap().push(request.clone());

        let n = self.payments.fetch_add(1, Ordering::SeqCst) + 1;
        let payment_id = format!("pay_sf_{}", n);
        let secret = match self.behaviour() {
            ModalBehaviour::Pay => TEST_KEY_SECRET,
            ModalBehaviour::PayWithForgedSignature => "not_the_key_secret",
            ModalBehaviour::Dismiss | ModalBehaviour::FailToLoad => {
                return PaymentOutcome::Dismissed
            }
        };

        PaymentOutcome::Completed {
            gateway_order_id: request.gateway_order_id.clone(),
            signature: generate_signature(&request.gateway_order_id, &payment_id, secret).unwrap(),
            gateway_payment_id: payment_id,
        }
    }
}

/// Fresh directory under the system temp dir for a file-backed cart.
pub fn temp_cart_dir() -> PathBuf {
    std::env::temp_dir().join(format!("storefront-cart-{}", uuid::Uuid::new_v4()))
}
