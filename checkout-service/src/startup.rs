//! Application startup and lifecycle management.

use crate::build_router;
use crate::config::{CheckoutConfig, OtpMode};
use crate::services::{
    ClientSignatures, InMemoryOrderStore, MockOtpAuthenticator, MongoOrderStore, OrderService,
    OrderStore, OtpAuthenticator, PaymentGateway, PaymentVerifier, PincodeResolver,
    RazorpayClient, StaticCatalog, StaticZoneDirectory, SupabaseOtpAuthenticator,
};
use crate::AppState;
use axum::Router;
use mongodb::{options::ClientOptions, Client};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

/// Compose the application state from its collaborators.
pub fn build_state(
    config: CheckoutConfig,
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn OrderStore>,
    authenticator: Arc<dyn OtpAuthenticator>,
) -> Result<AppState, AppError> {
    let pincodes = PincodeResolver::new(Arc::new(StaticZoneDirectory::seeded()));

    let orders = OrderService::new(
        gateway,
        store.clone(),
        Arc::new(StaticCatalog::seeded()),
        pincodes.clone(),
        config.razorpay.currency.clone(),
    );
    let payments = PaymentVerifier::new(config.razorpay.key_secret.clone(), store);

    let otp_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.otp_send_attempts,
        config.rate_limit.otp_send_window_seconds,
    )?;

    Ok(AppState {
        orders,
        payments,
        pincodes,
        authenticator,
        otp_rate_limiter,
        client_signatures: ClientSignatures::new(&config.signing),
    })
}

async fn connect_order_store(config: &CheckoutConfig) -> Result<Arc<dyn OrderStore>, AppError> {
    let Some(database) = &config.database else {
        tracing::warn!("CHECKOUT_DATABASE_URL not set - orders are kept in memory only");
        return Ok(Arc::new(InMemoryOrderStore::new()));
    };

    let mut client_options = ClientOptions::parse(database.url.expose_secret())
        .await
        .map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            AppError::from(e)
        })?;
    client_options.app_name = Some(config.service_name.clone());

    let client = Client::with_options(client_options)?;
    let store = MongoOrderStore::new(&client.database(&database.db_name));

    store.init_indexes().await.map_err(|e| {
        tracing::error!("Failed to initialize database indexes: {}", e);
        AppError::DatabaseError(e)
    })?;

    Ok(Arc::new(store))
}

fn otp_authenticator(config: &CheckoutConfig) -> Arc<dyn OtpAuthenticator> {
    match config.auth.otp_mode {
        OtpMode::Supabase => Arc::new(SupabaseOtpAuthenticator::new(&config.auth)),
        OtpMode::Mock => {
            tracing::warn!("OTP mock mode enabled - any 6-digit code is accepted");
            Arc::new(MockOtpAuthenticator)
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: CheckoutConfig) -> Result<Self, AppError> {
        let store = connect_order_store(&config).await?;

        let razorpay = RazorpayClient::new(config.razorpay.clone());
        if razorpay.is_configured() {
            tracing::info!("Razorpay client initialized");
        } else {
            tracing::warn!("Razorpay credentials not configured - order creation will fail");
        }

        let authenticator = otp_authenticator(&config);
        let port = config.common.port;
        let state = build_state(config, Arc::new(razorpay), store, authenticator)?;

        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!(port = self.port, "Listening");

        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("Service shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
