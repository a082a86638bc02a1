pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    signature::signature_validation_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::{
    ClientSignatures, OrderService, OtpAuthenticator, PaymentVerifier, PincodeResolver,
};

pub use startup::Application;

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
    pub payments: PaymentVerifier,
    pub pincodes: PincodeResolver,
    pub authenticator: Arc<dyn OtpAuthenticator>,
    pub otp_rate_limiter: IpRateLimiter,
    pub client_signatures: ClientSignatures,
}

pub fn build_router(state: AppState) -> Router {
    let otp_send_route = Router::new()
        .route("/auth/otp/send", post(handlers::auth::send_otp))
        .layer(from_fn_with_state(
            state.otp_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    // Order history is only served to the signing storefront.
    let orders_route = Router::new()
        .route("/orders", get(handlers::orders::list_orders))
        .layer(from_fn_with_state(
            state.client_signatures.clone(),
            signature_validation_middleware::<ClientSignatures>,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/pincode", get(handlers::pincode::check_pincode))
        .route("/order/create", post(handlers::orders::create_order))
        .route("/payment/verify", post(handlers::payments::verify_payment))
        .route("/auth/otp/verify", post(handlers::auth::verify_otp))
        .merge(otp_send_route)
        .merge(orders_route)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
}
