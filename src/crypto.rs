//! Token generation and webhook signature verification.

use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use rand::{Rng, thread_rng};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Generates an opaque confirmation token with 256 bits of entropy.
///
/// The token is base64url without padding, suitable for use in links.
pub fn generate_token() -> String {
    let mut token_bytes = [0u8; 32];
    thread_rng().fill(&mut token_bytes);

    general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Compute the HMAC-SHA256 of `payload` with `secret`, hex-encoded lowercase.
///
/// This is the signature scheme the Strike webhook uses: the raw request body
/// signed with the subscription secret, carried in the `X-Webhook-Signature`
/// header.
pub fn sign_payload_hex(payload: &[u8], secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    let signature = mac.finalize().into_bytes();

    signature.iter().map(|b| format!("{b:02x}")).collect()
}

/// Verify a webhook signature against the raw request body.
///
/// Returns `true` when the hex signature matches. Comparison is constant-time.
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    let expected = sign_payload_hex(payload, secret);
    constant_time_eq(signature.to_ascii_lowercase().as_bytes(), expected.as_bytes())
}

/// Constant-time comparison of a bearer credential against the configured value.
pub fn token_matches(presented: &str, configured: &str) -> bool {
    constant_time_eq(presented.as_bytes(), configured.as_bytes())
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_token_format() {
        let token = generate_token();

        // base64url(32 bytes) without padding is 43 chars
        assert_eq!(token.len(), 43);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert!(!token.contains('='));
    }

    #[test]
    fn test_generate_token_uniqueness() {
        let mut tokens = HashSet::new();
        for _ in 0..1000 {
            assert!(tokens.insert(generate_token()), "Generated duplicate token");
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let secret = "webhook-secret";
        let payload = br#"{"eventType":"invoice.updated","data":{}}"#;

        let signature = sign_payload_hex(payload, secret);
        assert_eq!(signature.len(), 64);

        assert!(verify_signature(payload, &signature, secret));

        // Case-insensitive on the presented signature
        assert!(verify_signature(payload, &signature.to_ascii_uppercase(), secret));

        // Wrong payload should fail
        assert!(!verify_signature(b"wrong", &signature, secret));

        // Wrong secret should fail
        assert!(!verify_signature(payload, &signature, "other-secret"));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(!verify_signature(b"payload", "not-hex-at-all", "secret"));
        assert!(!verify_signature(b"payload", "", "secret"));
    }

    #[test]
    fn test_signature_deterministic() {
        let payload = br#"{"test": 2432232314}"#;
        let a = sign_payload_hex(payload, "secret");
        let b = sign_payload_hex(payload, "secret");
        assert_eq!(a, b);
    }

    #[test]
    fn test_token_matches() {
        assert!(token_matches("abc123", "abc123"));
        assert!(!token_matches("abc123", "abc124"));
        assert!(!token_matches("abc", "abc123"));
    }
}
