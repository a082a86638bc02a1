pub mod checkout_client;

pub use checkout_client::{CheckoutApi, CheckoutApiError, CheckoutClient};
