use secrecy::Secret;
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct StorefrontConfig {
    /// Base URL of checkout-service, e.g. `http://localhost:8080`.
    #[serde(default = "default_checkout_url")]
    pub checkout_url: String,
    /// Directory holding the file-backed client store.
    #[serde(default = "default_cart_dir")]
    pub cart_dir: String,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// Identity presented to checkout-service on signed calls.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Shared with checkout-service; empty disables order history.
    #[serde(default = "default_signing_secret")]
    pub signing_secret: Secret<String>,
}

fn default_checkout_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_cart_dir() -> String {
    ".storefront".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    10
}

fn default_client_id() -> String {
    "storefront".to_string()
}

fn default_signing_secret() -> Secret<String> {
    Secret::new(String::new())
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            checkout_url: default_checkout_url(),
            cart_dir: default_cart_dir(),
            request_timeout_seconds: default_request_timeout_seconds(),
            client_id: default_client_id(),
            signing_secret: default_signing_secret(),
        }
    }
}

/// Read `STOREFRONT_*` variables, after loading `.env` if present.
pub fn get_configuration() -> Result<StorefrontConfig, config::ConfigError> {
    dotenvy::dotenv().ok();

    let settings = config::Config::builder()
        .add_source(config::File::with_name("storefront").required(false))
        .add_source(config::Environment::with_prefix("STOREFRONT").prefix_separator("_"))
        .build()?;

    settings.try_deserialize::<StorefrontConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_point_at_a_local_checkout_service() {
        let config: StorefrontConfig = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.checkout_url, "http://localhost:8080");
        assert_eq!(config.request_timeout_seconds, 10);
        assert_eq!(config.client_id, "storefront");
        assert!(config.signing_secret.expose_secret().is_empty());
    }

    #[test]
    fn overrides_replace_defaults() {
        let config: StorefrontConfig = config::Config::builder()
            .set_override("checkout_url", "https://checkout.example.in")
            .unwrap()
            .set_override("cart_dir", "/tmp/carts")
            .unwrap()
            .set_override("signing_secret", "shared")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.checkout_url, "https://checkout.example.in");
        assert_eq!(config.cart_dir, "/tmp/carts");
        assert_eq!(config.signing_secret.expose_secret(), "shared");
    }
}
