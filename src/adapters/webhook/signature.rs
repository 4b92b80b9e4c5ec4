//! `X-Hub-Signature-256` verification for WhatsApp Cloud webhooks.
//!
//! Meta signs the raw request body with HMAC-SHA256 keyed by the app secret
//! and sends it as `sha256=<hex>`.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::WebhookPayloadError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Verifier keyed by the app secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    app_secret: SecretString,
}

impl SignatureVerifier {
    pub fn new(app_secret: impl Into<String>) -> Self {
        Self {
            app_secret: SecretString::new(app_secret.into()),
        }
    }

    /// Checks `header` against the HMAC of `body`.
    ///
    /// # Errors
    ///
    /// - `MissingSignature` - no header, or an empty one
    /// - `InvalidSignature` - bad hex or mismatched digest
    pub fn verify(&self, body: &[u8], header: Option<&str>) -> Result<(), WebhookPayloadError> {
        let header = header.map(str::trim).unwrap_or_default();
        let hex_digest = header.strip_prefix("sha256=").unwrap_or(header).trim();
        if hex_digest.is_empty() {
            return Err(WebhookPayloadError::MissingSignature);
        }

        let provided =
            hex::decode(hex_digest).map_err(|_| WebhookPayloadError::InvalidSignature)?;
        let expected = self.digest(body);

        if constant_time_compare(&expected, &provided) {
            Ok(())
        } else {
            tracing::warn!(
                body_len = body.len(),
                "Webhook signature mismatch"
            );
            Err(WebhookPayloadError::InvalidSignature)
        }
    }

    /// Produces the header value Meta would send for `body`.
    pub fn sign(&self, body: &[u8]) -> String {
        format!("sha256={}", hex::encode(self.digest(body)))
    }

    fn digest(&self, body: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(self.app_secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key");
        mac.update(body);
        mac.finalize().into_bytes().to_vec()
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("app_secret", &"[REDACTED]")
            .finish()
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
