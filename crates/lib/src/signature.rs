//! Webhook signature verification: base64-encoded HMAC-SHA256 over the raw body.
//!
//! Verification must run on the exact bytes received, before any JSON parsing,
//! because re-serialization is not byte-identical.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify the `X-Line-Signature` value against the raw request body.
/// The header carries the base64-encoded HMAC-SHA256 of the body keyed by the
/// channel secret. Returns false on any mismatch, including an absent or empty
/// header. No side effects.
pub fn verify_signature(body: &[u8], presented: &str, channel_secret: &str) -> bool {
    if presented.is_empty() {
        return false;
    }
    let mut mac = match HmacSha256::new_from_slice(channel_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    let computed = base64::Engine::encode(
        &base64::engine::general_purpose::STANDARD,
        mac.finalize().into_bytes(),
    );
    constant_time_eq(computed.as_bytes(), presented.as_bytes())
}

/// Constant-time byte comparison (no early exit on first mismatch).
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
