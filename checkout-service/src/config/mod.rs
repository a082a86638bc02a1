use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct CheckoutConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    /// `None` selects the in-memory order store (never in production).
    pub database: Option<DatabaseConfig>,
    pub razorpay: RazorpayConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub signing: SigningConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub db_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: Secret<String>,
    pub api_base_url: String,
    pub currency: String,
}

impl RazorpayConfig {
    pub fn has_secret(&self) -> bool {
        !self.key_secret.expose_secret().is_empty()
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OtpMode {
    /// Real SMS OTP through Supabase Auth.
    Supabase,
    /// Accept any 6-digit code; local development and tests only.
    Mock,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AuthConfig {
    pub otp_mode: OtpMode,
    pub supabase_url: String,
    pub supabase_anon_key: Secret<String>,
}

/// Shared secret the storefront signs `GET /orders` with.
#[derive(Deserialize, Clone, Debug)]
pub struct SigningConfig {
    pub client_id: String,
    pub secret: Secret<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RateLimitConfig {
    pub otp_send_attempts: u32,
    pub otp_send_window_seconds: u64,
}

impl CheckoutConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = common.is_production();

        let database = match env::var("CHECKOUT_DATABASE_URL") {
            Ok(url) => Some(DatabaseConfig {
                url: Secret::new(url),
                db_name: get_env("CHECKOUT_DATABASE_NAME", Some("checkout_db"), is_prod)?,
            }),
            Err(_) if is_prod => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "CHECKOUT_DATABASE_URL is required in production but not set"
                )));
            }
            Err(_) => None,
        };

        let otp_mode = match get_env("AUTH_OTP_MODE", Some("mock"), is_prod)?.as_str() {
            "supabase" => OtpMode::Supabase,
            "mock" if !is_prod => OtpMode::Mock,
            "mock" => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "AUTH_OTP_MODE=mock is not allowed in production"
                )));
            }
            other => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "AUTH_OTP_MODE must be 'supabase' or 'mock', got '{}'",
                    other
                )));
            }
        };

        Ok(Self {
            common,
            database,
            razorpay: RazorpayConfig {
                key_id: get_env("RAZORPAY_KEY_ID", Some(""), is_prod)?,
                key_secret: Secret::new(get_env("RAZORPAY_KEY_SECRET", Some(""), is_prod)?),
                api_base_url: get_env(
                    "RAZORPAY_API_BASE_URL",
                    Some("https://api.razorpay.com/v1"),
                    is_prod,
                )?,
                currency: get_env("CHECKOUT_CURRENCY", Some("INR"), is_prod)?,
            },
            auth: AuthConfig {
                otp_mode,
                supabase_url: get_env("SUPABASE_URL", Some(""), is_prod && otp_mode == OtpMode::Supabase)?,
                supabase_anon_key: Secret::new(get_env(
                    "SUPABASE_ANON_KEY",
                    Some(""),
                    is_prod && otp_mode == OtpMode::Supabase,
                )?),
            },
            rate_limit: RateLimitConfig {
                otp_send_attempts: parse_env(
                    "OTP_SEND_LIMIT_PER_WINDOW",
                    &get_env("OTP_SEND_LIMIT_PER_WINDOW", Some("5"), false)?,
                )?,
                otp_send_window_seconds: parse_env(
                    "OTP_SEND_WINDOW_SECONDS",
                    &get_env("OTP_SEND_WINDOW_SECONDS", Some("900"), false)?,
                )?,
            },
            signing: SigningConfig {
                client_id: get_env("STOREFRONT_CLIENT_ID", Some("storefront"), false)?,
                secret: Secret::new(get_env("STOREFRONT_SIGNING_SECRET", Some(""), is_prod)?),
            },
            service_name: "checkout-service".to_string(),
        })
    }
}

fn get_env(key: &str, default: Option<&str>, required: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if required {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, value, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_settings() {
        assert_eq!(parse_env::<u32>("OTP_SEND_LIMIT_PER_WINDOW", "5").unwrap(), 5);
        assert_eq!(parse_env::<u64>("OTP_SEND_WINDOW_SECONDS", " 900 ").unwrap(), 900);
    }

    #[test]
    fn malformed_numeric_setting_is_a_config_error() {
        for value in ["five", "", "-1", "4294967296"] {
            let err = parse_env::<u32>("OTP_SEND_LIMIT_PER_WINDOW", value).unwrap_err();
            assert!(matches!(err, AppError::ConfigError(_)));
            assert!(err.to_string().contains("OTP_SEND_LIMIT_PER_WINDOW"));
        }
    }
}
