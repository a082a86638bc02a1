//! Signing clients and the nonces they have spent.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;
use service_core::middleware::signature::{SignatureStore, MAX_CLOCK_SKEW_SECONDS};
use std::sync::Arc;

use crate::config::SigningConfig;

/// Nonces are kept for twice the clock-skew window; a signature older than
/// that is already rejected on its timestamp.
const NONCE_RETENTION_SECONDS: i64 = 2 * MAX_CLOCK_SKEW_SECONDS;

#[derive(Clone)]
pub struct ClientSignatures {
    client_id: String,
    secret: Secret<String>,
    nonces: Arc<DashMap<String, i64>>,
}

impl ClientSignatures {
    pub fn new(config: &SigningConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            secret: config.secret.clone(),
            nonces: Arc::new(DashMap::new()),
        }
    }

    fn forget_expired(&self, now: i64) {
        self.nonces
            .retain(|_, seen_at| now - *seen_at <= NONCE_RETENTION_SECONDS);
    }
}

#[async_trait]
impl SignatureStore for ClientSignatures {
    async fn validate_nonce(&self, nonce: &str) -> Result<bool, AppError> {
        let now = Utc::now().timestamp();
        self.forget_expired(now);

        match self.nonces.entry(nonce.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(now);
                Ok(true)
            }
        }
    }

    async fn get_signing_secret(&self, client_id: &str) -> Result<Option<String>, AppError> {
        let secret = self.secret.expose_secret();
        // An unset secret admits nobody.
        if client_id != self.client_id || secret.is_empty() {
            return Ok(None);
        }
        Ok(Some(secret.clone()))
    }
}
