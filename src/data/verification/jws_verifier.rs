use std::sync::Arc;

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};
use chrono::{DateTime, Utc};
use openssl::{bn::BigNum, ecdsa::EcdsaSig, nid::Nid, x509::X509};
use serde::Deserialize;

use crate::errors::JwsError;

use super::{decode_protocol::SignedPayload, trust_store::TrustStore};

/// The only algorithm the App Store signs with.
const ES256: &str = "ES256";
/// Raw `r || s` encoding of a P-256 signature.
const ES256_SIGNATURE_LEN: usize = 64;
const CLOCK_SKEW_SECONDS: i64 = 60;

/// The output of a successful verification. Nothing in `payload` has been
/// interpreted yet.
#[derive(Debug, Clone)]
pub struct VerifiedClaims {
    pub payload: Vec<u8>,
    pub algorithm: String,
    pub signer: X509,
}

#[derive(Debug, Deserialize)]
struct JwsHeader {
    alg: Option<String>,
    x5c: Option<Vec<String>>,
}

/// The three decoded segments of a compact JWS, plus the exact bytes the
/// signature covers.
struct CompactJws<'a> {
    signing_input: &'a str,
    header: Vec<u8>,
    payload: Vec<u8>,
    signature: Vec<u8>,
}

impl<'a> CompactJws<'a> {
    fn split(token: &'a str) -> Result<Self, JwsError> {
        let segments: Vec<&str> = token.split('.').collect();
        let &[header, payload, signature] = segments.as_slice() else {
            return Err(JwsError::MalformedToken(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        };
        Ok(Self {
            signing_input: &token[..header.len() + 1 + payload.len()],
            header: decode_segment("header", header)?,
            payload: decode_segment("payload", payload)?,
            signature: decode_segment("signature", signature)?,
        })
    }
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>, JwsError> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| JwsError::MalformedToken(format!("{name} is not base64url: {e}")))
}

/// Verifies compact JWS tokens signed by the App Store.
///
/// Verification runs strictly in order: token structure, then the `x5c`
/// chain against the pinned trust anchors, then the signature under the
/// leaf's key. The payload is returned untouched only after all three pass.
#[derive(Debug, Clone)]
pub struct JwsVerifier {
    trust_store: Arc<TrustStore>,
}

impl JwsVerifier {
    pub fn new(trust_store: Arc<TrustStore>) -> Self {
        Self { trust_store }
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedClaims, JwsError> {
        let jws = CompactJws::split(token)?;

        let header: JwsHeader = serde_json::from_slice(&jws.header)
            .map_err(|e| JwsError::MalformedToken(format!("invalid header: {e}")))?;
        let algorithm = header
            .alg
            .ok_or_else(|| JwsError::MalformedToken("header has no alg".to_owned()))?;
        if algorithm != ES256 {
            return Err(JwsError::MalformedToken(format!(
                "unsupported algorithm {algorithm}"
            )));
        }
        let x5c = header.x5c.unwrap_or_default();
        if x5c.is_empty() {
            return Err(JwsError::MissingCertificate);
        }

        let mut chain = x5c
            .iter()
            .map(String::as_str)
            .map(decode_certificate)
            .collect::<Result<Vec<_>, _>>()?;
        let signer = chain.remove(0);
        self.trust_store.verify_chain(&signer, &chain)?;

        verify_signature(&signer, jws.signing_input.as_bytes(), &jws.signature)?;

        Ok(VerifiedClaims {
            payload: jws.payload,
            algorithm,
            signer,
        })
    }

    /// Verifies `token` and decodes its payload as `T`.
    pub fn verify_and_decode<T: SignedPayload>(&self, token: &str) -> Result<T, JwsError> {
        decode_claims(&self.verify(token)?)
    }
}

/// Decodes verified claims into a payload shape. Unknown fields are ignored
/// and missing ones take their defaults.
pub fn decode_claims<T: SignedPayload>(claims: &VerifiedClaims) -> Result<T, JwsError> {
    check_time_claims(&claims.payload, Utc::now())?;
    let value: T = serde_json::from_slice(&claims.payload)
        .map_err(|e| JwsError::ClaimsDecode(e.to_string()))?;
    value.validate()?;
    Ok(value)
}

/// Registered `exp` / `iat` claims, in epoch seconds. App Store payloads
/// normally carry neither.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TimeClaims {
    exp: Option<i64>,
    iat: Option<i64>,
}

fn check_time_claims(payload: &[u8], now: DateTime<Utc>) -> Result<(), JwsError> {
    let Ok(claims) = serde_json::from_slice::<TimeClaims>(payload) else {
        // Not an object with numeric time claims; the typed decode reports it.
        return Ok(());
    };
    let now = now.timestamp();
    if let Some(exp) = claims.exp {
        if exp.saturating_add(CLOCK_SKEW_SECONDS) <= now {
            return Err(JwsError::ClaimsDecode(format!("token expired at {exp}")));
        }
    }
    if let Some(iat) = claims.iat {
        if iat.saturating_sub(CLOCK_SKEW_SECONDS) > now {
            return Err(JwsError::ClaimsDecode(format!(
                "token issued in the future at {iat}"
            )));
        }
    }
    Ok(())
}

fn decode_certificate(encoded: &str) -> Result<X509, JwsError> {
    let der = STANDARD
        .decode(encoded)
        .map_err(|e| JwsError::CertificateDecode(format!("x5c entry is not base64: {e}")))?;
    X509::from_der(&der).map_err(|e| JwsError::CertificateDecode(e.to_string()))
}

fn verify_signature(signer: &X509, signing_input: &[u8], signature: &[u8]) -> Result<(), JwsError> {
    let invalid = |e: openssl::error::ErrorStack| JwsError::SignatureVerification(e.to_string());

    if signature.len() != ES256_SIGNATURE_LEN {
        return Err(JwsError::SignatureVerification(format!(
            "expected {ES256_SIGNATURE_LEN} signature bytes, found {}",
            signature.len()
        )));
    }
    let key = signer
        .public_key()
        .and_then(|key| key.ec_key())
        .map_err(|e| {
            JwsError::SignatureVerification(format!("signer key is not an EC key: {e}"))
        })?;
    if key.group().curve_name() != Some(Nid::X9_62_PRIME256V1) {
        return Err(JwsError::SignatureVerification(
            "signer key is not on P-256".to_owned(),
        ));
    }
    let (r, s) = signature.split_at(ES256_SIGNATURE_LEN / 2);
    let signature = EcdsaSig::from_private_components(
        BigNum::from_slice(r).map_err(invalid)?,
        BigNum::from_slice(s).map_err(invalid)?,
    )
    .map_err(invalid)?;
    let digest = openssl::sha::sha256(signing_input);
    if signature.verify(&digest, &key).map_err(invalid)? {
        Ok(())
    } else {
        Err(JwsError::SignatureVerification(
            "signature does not match header and payload".to_owned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::{
        models::app_store_server_api::jws_transaction_decoded_payload_model::JwsTransactionDecodedPayloadModel,
        verification::test_support::{ec_key, ec_key_on, sign_compact, TestPki},
    };

    fn transaction_payload() -> serde_json::Value {
        json!({
            "transactionId": "2000000123",
            "originalTransactionId": "2000000100",
            "bundleId": "com.example.app",
            "productId": "com.example.monthly",
            "purchaseDate": 1695900000000i64,
            "expiresDate": 0,
            "signedDate": 1695900000500i64,
            "environment": "Sandbox",
            "inAppOwnershipType": "PURCHASED",
        })
    }

    #[test]
    fn test_verify_returns_original_payload_bytes() {
        let pki = TestPki::generate();
        let payload = br#"{"transactionId":"1","extra":[1,2,3]}"#;
        let token = pki.sign_raw(&pki.header(), payload);

        let claims = pki.verifier().verify(&token).unwrap();
        assert_eq!(claims.payload, payload);
        assert_eq!(claims.algorithm, "ES256");
        assert_eq!(claims.signer.to_der().unwrap(), pki.leaf.to_der().unwrap());
    }

    #[test]
    fn test_verify_is_idempotent() {
        let pki = TestPki::generate();
        let verifier = pki.verifier();
        let token = pki.sign(&transaction_payload());
        let first = verifier.verify(&token).unwrap();
        let second = verifier.verify(&token).unwrap();
        assert_eq!(first.payload, second.payload);

        let tampered = format!("{}x", &token[..token.len() - 1]);
        assert_eq!(verifier.verify(&tampered).err(), verifier.verify(&tampered).err());
    }

    #[test]
    fn test_verify_and_decode_transaction() {
        let pki = TestPki::generate();
        let token = pki.sign(&transaction_payload());
        let transaction: JwsTransactionDecodedPayloadModel =
            pki.verifier().verify_and_decode(&token).unwrap();
        assert_eq!(transaction.transaction_id, "2000000123");
        assert_eq!(transaction.purchase_date.unwrap().timestamp_millis(), 1_695_900_000_000);
        assert!(transaction.expires_date.is_none());
        assert_eq!(transaction.quantity, 0);
    }

    #[test]
    fn test_wrong_segment_count_is_malformed() {
        let verifier = TestPki::generate().verifier();
        for token in ["", "a.b", "a.b.c.d"] {
            assert!(matches!(
                verifier.verify(token),
                Err(JwsError::MalformedToken(_))
            ));
        }
    }

    #[test]
    fn test_invalid_base64_is_malformed() {
        let verifier = TestPki::generate().verifier();
        assert!(matches!(
            verifier.verify("e30.e30.!!!"),
            Err(JwsError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_malformed_header_fails_before_certificate_work() {
        let pki = TestPki::generate();
        // Signed by a key that chains nowhere; the header error must win.
        let token = sign_compact(b"{not json", b"{}", &pki.leaf_key);
        let foreign_verifier = TestPki::generate().verifier();
        assert!(matches!(
            foreign_verifier.verify(&token),
            Err(JwsError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_unsupported_algorithm_is_malformed() {
        let pki = TestPki::generate();
        let mut header = pki.header();
        header["alg"] = json!("RS256");
        let token = pki.sign_raw(&header, b"{}");
        assert!(matches!(
            pki.verifier().verify(&token),
            Err(JwsError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_missing_or_empty_x5c() {
        let pki = TestPki::generate();
        for header in [
            json!({"alg": "ES256"}),
            json!({"alg": "ES256", "x5c": []}),
            json!({"alg": "ES256", "x5c": null}),
        ] {
            let token = pki.sign_raw(&header, b"{}");
            assert_eq!(
                pki.verifier().verify(&token).err(),
                Some(JwsError::MissingCertificate)
            );
        }
    }

    #[test]
    fn test_bad_certificate_der() {
        let pki = TestPki::generate();
        let header = json!({"alg": "ES256", "x5c": [STANDARD.encode(b"not der")]});
        let token = pki.sign_raw(&header, b"{}");
        assert!(matches!(
            pki.verifier().verify(&token),
            Err(JwsError::CertificateDecode(_))
        ));
    }

    #[test]
    fn test_foreign_chain_is_untrusted() {
        let trusted = TestPki::generate();
        let foreign = TestPki::generate();
        let token = foreign.sign(&transaction_payload());
        assert!(matches!(
            trusted.verifier().verify(&token),
            Err(JwsError::UntrustedCertificate(_))
        ));
    }

    #[test]
    fn test_trusted_chain_with_foreign_signer_key_fails_signature() {
        let pki = TestPki::generate();
        let impostor = TestPki::generate();
        // Header carries the trusted leaf, but the signature comes from a key
        // the leaf does not certify.
        let token = sign_compact(
            pki.header().to_string().as_bytes(),
            transaction_payload().to_string().as_bytes(),
            &impostor.leaf_key,
        );
        assert!(matches!(
            pki.verifier().verify(&token),
            Err(JwsError::SignatureVerification(_))
        ));
    }

    #[test]
    fn test_tampered_payload_fails_signature() {
        let pki = TestPki::generate();
        let token = pki.sign(&transaction_payload());
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(br#"{"transactionId":"forged"}"#);
        parts[1] = &forged;
        assert!(matches!(
            pki.verifier().verify(&parts.join(".")),
            Err(JwsError::SignatureVerification(_))
        ));
    }

    #[test]
    fn test_truncated_signature_fails_signature() {
        let pki = TestPki::generate();
        let token = pki.sign(&transaction_payload());
        let (signed, _) = token.rsplit_once('.').unwrap();
        let token = format!("{signed}.{}", URL_SAFE_NO_PAD.encode([7u8; 10]));
        assert!(matches!(
            pki.verifier().verify(&token),
            Err(JwsError::SignatureVerification(_))
        ));
    }

    #[test]
    fn test_verified_payload_of_wrong_shape_is_claims_error() {
        let pki = TestPki::generate();
        let token = pki.sign(&json!({"transactionId": 42}));
        let result: Result<JwsTransactionDecodedPayloadModel, _> =
            pki.verifier().verify_and_decode(&token);
        assert!(matches!(result, Err(JwsError::ClaimsDecode(_))));
    }

    #[test]
    fn test_time_claims_are_checked_when_present() {
        let now = Utc::now();
        let at = |offset: i64| (now.timestamp() + offset).to_string();
        let expired = format!(r#"{{"exp":{}}}"#, at(-3600));
        let future = format!(r#"{{"iat":{}}}"#, at(3600));
        let current = format!(r#"{{"iat":{},"exp":{}}}"#, at(-10), at(600));

        assert!(matches!(
            check_time_claims(expired.as_bytes(), now),
            Err(JwsError::ClaimsDecode(_))
        ));
        assert!(matches!(
            check_time_claims(future.as_bytes(), now),
            Err(JwsError::ClaimsDecode(_))
        ));
        assert!(check_time_claims(current.as_bytes(), now).is_ok());
        assert!(check_time_claims(b"{}", now).is_ok());
    }

    #[test]
    fn test_extreme_time_claims_do_not_overflow() {
        let pki = TestPki::generate();
        let verifier = pki.verifier();
        for payload in [
            json!({"transactionId": "1", "exp": i64::MAX}),
            json!({"transactionId": "1", "iat": i64::MIN}),
        ] {
            let result: Result<JwsTransactionDecodedPayloadModel, _> =
                verifier.verify_and_decode(&pki.sign(&payload));
            assert!(result.is_ok(), "{payload}: {result:?}");
        }
        let result: Result<JwsTransactionDecodedPayloadModel, _> =
            verifier.verify_and_decode(&pki.sign(&json!({"transactionId": "1", "exp": i64::MIN})));
        assert!(matches!(result, Err(JwsError::ClaimsDecode(_))));
    }

    #[test]
    fn test_expired_signing_certificate_is_untrusted() {
        let pki = TestPki::generate();
        let key = ec_key();
        let leaf = pki.issue_leaf(&key, -2 * 86_400, -86_400);
        let token = sign_compact(
            pki.header_for(&leaf).to_string().as_bytes(),
            transaction_payload().to_string().as_bytes(),
            &key,
        );
        assert!(matches!(
            pki.verifier().verify(&token),
            Err(JwsError::UntrustedCertificate(_))
        ));
    }

    #[test]
    fn test_signer_key_on_other_curve_fails_signature() {
        let pki = TestPki::generate();
        let leaf = pki.issue_leaf(&ec_key_on(Nid::SECP384R1), -3600, 86_400);
        // 64 raw bytes so the length check passes and the curve check decides.
        let token = sign_compact(
            pki.header_for(&leaf).to_string().as_bytes(),
            transaction_payload().to_string().as_bytes(),
            &pki.leaf_key,
        );
        match pki.verifier().verify(&token) {
            Err(JwsError::SignatureVerification(reason)) => assert!(reason.contains("P-256")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_expired_payload_fails_decode_but_not_verify() {
        let pki = TestPki::generate();
        let token = pki.sign(&json!({"transactionId": "1", "exp": 1}));
        let verifier = pki.verifier();
        assert!(verifier.verify(&token).is_ok());
        let result: Result<JwsTransactionDecodedPayloadModel, _> = verifier.verify_and_decode(&token);
        assert!(matches!(result, Err(JwsError::ClaimsDecode(_))));
    }
}
