//! Webhook signature verification
//!
//! The gateway signs every webhook delivery with HMAC-SHA512 over the raw
//! request body, hex-encoded in the `X-signature` header. Verification
//! runs before any JSON parsing; a body that fails the check is discarded
//! unread.

use ring::hmac;

/// Verify a hex-encoded HMAC-SHA512 signature over the raw body.
///
/// Uses `ring`'s constant-time verification. Returns `false` for malformed
/// hex rather than erroring.
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let key = hmac::Key::new(hmac::HMAC_SHA512, secret.as_bytes());
    hmac::verify(&key, body, &signature).is_ok()
}

/// Produce the hex signature for a body. Test helper and client-side use.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA512, secret.as_bytes());
    hex::encode(hmac::sign(&key, body).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let body = br#"{"event":"charge.success"}"#;
        let sig = sign("secret", body);
        assert!(verify_signature("secret", body, &sig));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let body = b"payload";
        let sig = sign("secret", body);
        assert!(!verify_signature("other", body, &sig));
    }

    #[test]
    fn test_tampered_body_fails() {
        let sig = sign("secret", b"payload");
        assert!(!verify_signature("secret", b"payload2", &sig));
    }

    #[test]
    fn test_malformed_hex_fails_cleanly() {
        assert!(!verify_signature("secret", b"payload", "not-hex!!"));
        assert!(!verify_signature("secret", b"payload", ""));
    }
}
