use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Header GitHub signs webhook payloads with.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Verifies the `sha256=<hex>` signature header against the raw payload.
/// The digest comparison is constant-time.
pub fn verify(secret: &str, payload: &[u8], header: &str) -> Result<(), WebhookError> {
    let hex_digest = header
        .strip_prefix("sha256=")
        .ok_or(WebhookError::InvalidSignature("missing sha256= prefix"))?;
    let digest =
        hex::decode(hex_digest).map_err(|_| WebhookError::InvalidSignature("malformed hex"))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature("invalid secret"))?;
    mac.update(payload);
    mac.verify_slice(&digest)
        .map_err(|_| WebhookError::InvalidSignature("digest mismatch"))
}
