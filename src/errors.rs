use crate::domain::entities::decode_outcome::SignedItemErrors;

/// Failure to verify or decode a single compact JWS token.
///
/// Variants are ordered by the stage at which they can occur: structure,
/// certificate chain, signature, payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JwsError {
    #[error("Malformed JWS: {0}.")]
    MalformedToken(String),
    #[error("JWS header does not carry an x5c certificate chain.")]
    MissingCertificate,
    #[error("Could not decode JWS certificate: {0}.")]
    CertificateDecode(String),
    #[error("JWS certificate does not chain to a trusted root: {0}.")]
    UntrustedCertificate(String),
    #[error("JWS signature verification failed: {0}.")]
    SignatureVerification(String),
    #[error("Could not decode JWS claims: {0}.")]
    ClaimsDecode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppStoreError {
    #[error("Could not load trust anchor certificate ({which}): {reason}.")]
    CertificateLoad { which: &'static str, reason: String },
    #[error("Could not decode App Store Server API response: {0}.")]
    EnvelopeDecode(String),
    #[error(transparent)]
    Jws(#[from] JwsError),
    #[error(transparent)]
    SignedItems(#[from] SignedItemErrors),
    #[error("App Store Server API returned error {code}: {message}")]
    Platform { code: i64, message: String },
    #[error("App Store Server API rejected the bearer token.")]
    Unauthorized,
    #[error("App Store Server API returned unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("Error calling out to App Store Server API: {0}.")]
    Transport(String),
    #[error("Could not encode App Store Server API request body: {0}.")]
    RequestEncode(String),
    #[error("Failed to build App Store Server API bearer token: {0}.")]
    TokenMint(String),
    #[error("Invalid App Store configuration: {0}.")]
    Config(String),
}
