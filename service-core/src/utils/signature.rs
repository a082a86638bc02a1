use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Lowercase hex HMAC-SHA256 of `payload` keyed with `secret`.
pub fn sign_hex(secret: &str, payload: &str) -> Result<String, anyhow::Error> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid key length: {}", e))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Recompute the signature and compare it byte-for-byte in constant time.
///
/// The comparison is case-sensitive: an uppercase rendering of a valid
/// digest does not verify.
pub fn verify_hex(secret: &str, payload: &str, signature: &str) -> Result<bool, anyhow::Error> {
    let expected = sign_hex(secret, payload)?;

    let expected_bytes = expected.as_bytes();
    let signature_bytes = signature.as_bytes();

    if expected_bytes.len() != signature_bytes.len() {
        return Ok(false);
    }

    Ok(expected_bytes.ct_eq(signature_bytes).into())
}

/// The parts of a service-to-service call covered by its signature.
#[derive(Debug, Clone, Copy)]
pub struct SignedRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub timestamp: i64,
    pub nonce: &'a str,
    pub user_id: &'a str,
    pub body: &'a [u8],
}

impl SignedRequest<'_> {
    /// HMAC-SHA256(method|path|timestamp|nonce|user_id|body_hash, secret)
    pub fn sign(&self, secret: &str) -> Result<String, anyhow::Error> {
        sign_hex(secret, &self.payload())
    }

    pub fn verify(&self, secret: &str, signature: &str) -> Result<bool, anyhow::Error> {
        verify_hex(secret, &self.payload(), signature)
    }

    fn payload(&self) -> String {
        let body_hash = hex::encode(Sha256::digest(self.body));
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.method, self.path, self.timestamp, self.nonce, self.user_id, body_hash
        )
    }
}
