//! Client half of the bookstore checkout: the cart and the checkout page
//! logic, independent of any UI runtime.

pub mod cart;
pub mod checkout;
pub mod config;
pub mod services;

use cart::{CartStore, ClientStore, FileClientStore};
use config::StorefrontConfig;
use services::{CheckoutApiError, CheckoutClient};
use std::sync::Arc;

/// One browsing session: its cart and a client for checkout-service.
pub struct Session {
    pub cart: CartStore,
    pub checkout: Arc<CheckoutClient>,
}

impl Session {
    pub fn start(config: &StorefrontConfig) -> Result<Self, CheckoutApiError> {
        let store: Arc<dyn ClientStore> = Arc::new(FileClientStore::new(&config.cart_dir));
        Self::with_store(config, store)
    }

    pub fn with_store(
        config: &StorefrontConfig,
        store: Arc<dyn ClientStore>,
    ) -> Result<Self, CheckoutApiError> {
        Ok(Self {
            cart: CartStore::hydrate(store),
            checkout: Arc::new(CheckoutClient::from_config(config)?),
        })
    }
}
