//! Webhook payload signature verification.
//!
//! Verification is mandatory: the verifier cannot be built without a
//! secret, so "no secret configured" is a startup configuration error
//! rather than a silent bypass.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Scheme prefix of the signature header value.
const SIGNATURE_PREFIX: &str = "sha256=";

/// Errors raised while verifying a delivery signature.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The webhook secret is empty.
    #[error("webhook secret must not be empty")]
    EmptySecret,

    /// The delivery carried no signature header.
    #[error("missing signature header")]
    MissingSignature,

    /// The signature header is not `sha256=<hex>`.
    #[error("malformed signature header")]
    MalformedSignature,

    /// The signature does not match the payload.
    #[error("signature mismatch")]
    Mismatch,
}

/// HMAC-SHA256 verifier for webhook deliveries.
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl SignatureVerifier {
    /// Creates a verifier from a shared secret.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::EmptySecret`] for an empty secret.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, SignatureError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(SignatureError::EmptySecret);
        }
        Ok(Self { secret })
    }

    /// Verifies a payload against its signature header.
    ///
    /// The comparison is constant-time via [`Mac::verify_slice`].
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when the header is missing, malformed,
    /// or does not match the payload.
    pub fn verify(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<(), SignatureError> {
        let header = signature_header.ok_or(SignatureError::MissingSignature)?;
        let hex_digest = header
            .strip_prefix(SIGNATURE_PREFIX)
            .ok_or(SignatureError::MalformedSignature)?;
        let expected = hex::decode(hex_digest).map_err(|_| SignatureError::MalformedSignature)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| SignatureError::MalformedSignature)?;
        mac.update(payload);
        mac.verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }

    /// Computes the signature header value for a payload.
    ///
    /// Used by tests and local delivery tooling.
    #[must_use]
    pub fn signature_for(&self, payload: &[u8]) -> String {
        let mut mac = match HmacSha256::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            // HMAC accepts keys of any length; unreachable in practice.
            Err(_) => return String::new(),
        };
        mac.update(payload);
        let digest = mac.finalize().into_bytes();
        format!("{SIGNATURE_PREFIX}{}", hex::encode(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_a_configuration_error() {
        assert!(matches!(
            SignatureVerifier::new(""),
            Err(SignatureError::EmptySecret)
        ));
    }

    #[test]
    fn round_trip_signature_verifies() {
        let verifier = SignatureVerifier::new("s3cret").unwrap();
        let signature = verifier.signature_for(b"payload");
        assert!(verifier.verify(b"payload", Some(&signature)).is_ok());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let verifier = SignatureVerifier::new("s3cret").unwrap();
        let signature = verifier.signature_for(b"payload");
        assert!(matches!(
            verifier.verify(b"tampered", Some(&signature)),
            Err(SignatureError::Mismatch)
        ));
    }

    #[test]
    fn missing_header_is_rejected() {
        let verifier = SignatureVerifier::new("s3cret").unwrap();
        assert!(matches!(
            verifier.verify(b"payload", None),
            Err(SignatureError::MissingSignature)
        ));
    }

    #[test]
    fn header_without_scheme_prefix_is_malformed() {
        let verifier = SignatureVerifier::new("s3cret").unwrap();
        assert!(matches!(
            verifier.verify(b"payload", Some("deadbeef")),
            Err(SignatureError::MalformedSignature)
        ));
    }

    #[test]
    fn non_hex_digest_is_malformed() {
        let verifier = SignatureVerifier::new("s3cret").unwrap();
        assert!(matches!(
            verifier.verify(b"payload", Some("sha256=zzzz")),
            Err(SignatureError::MalformedSignature)
        ));
    }
}
