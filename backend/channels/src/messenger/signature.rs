//! `x-hub-signature` verification: HMAC-SHA1 over the raw request body.

use hmac::{Hmac, Mac};
use kunstbot_core::KunstbotError;
use sha1::Sha1;

pub const SIGNATURE_HEADER: &str = "x-hub-signature";

type HmacSha1 = Hmac<Sha1>;

/// Hex HMAC-SHA1 of `body` keyed with `secret`.
#[cfg(test)]
pub(crate) fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Check a `sha1=<hex>` header value against the body.
///
/// Only `sha1` is accepted; a different algorithm, undecodable hex or a
/// wrong digest is a mismatch.
pub fn verify_signature(secret: &str, body: &[u8], header: &str) -> Result<(), KunstbotError> {
    let Some((algorithm, digest)) = header.split_once('=') else {
        return Err(KunstbotError::MalformedSignature(header.to_string()));
    };
    if !algorithm.eq_ignore_ascii_case("sha1") {
        return Err(KunstbotError::MalformedSignature(header.to_string()));
    }
    let provided = hex::decode(digest.trim()).map_err(|_| KunstbotError::SignatureMismatch)?;

    let mut mac = match HmacSha1::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return Err(KunstbotError::SignatureMismatch),
    };
    mac.update(body);
    mac.verify_slice(&provided)
        .map_err(|_| KunstbotError::SignatureMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "app-secret";
    const BODY: &[u8] = br#"{"object":"page","entry":[]}"#;

    #[test]
    fn accepts_matching_digest() {
        let header = format!("sha1={}", sign(SECRET, BODY));
        assert!(verify_signature(SECRET, BODY, &header).is_ok());
    }

    #[test]
    fn known_vector() {
        // RFC 2202 test case 2.
        assert_eq!(
            sign("Jefe", b"what do ya want for nothing?"),
            "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79"
        );
    }

    #[test]
    fn rejects_other_digest() {
        let header = format!("sha1={}", sign("other-secret", BODY));
        assert!(matches!(
            verify_signature(SECRET, BODY, &header),
            Err(KunstbotError::SignatureMismatch)
        ));
    }

    #[test]
    fn rejects_tampered_body() {
        let header = format!("sha1={}", sign(SECRET, BODY));
        assert!(verify_signature(SECRET, b"{}", &header).is_err());
    }

    #[test]
    fn rejects_malformed_header() {
        assert!(matches!(
            verify_signature(SECRET, BODY, "deadbeef"),
            Err(KunstbotError::MalformedSignature(_))
        ));
        let sha256 = format!("sha256={}", sign(SECRET, BODY));
        assert!(verify_signature(SECRET, BODY, &sha256).is_err());
        assert!(verify_signature(SECRET, BODY, "sha1=not-hex").is_err());
    }
}
