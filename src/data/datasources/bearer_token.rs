use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;

use crate::errors::AppStoreError;

const AUDIENCE: &str = "appstoreconnect-v1";
const TOKEN_LIFETIME_MINUTES: i64 = 15;

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    iat: i64,
    exp: i64,
    aud: &'a str,
    bid: &'a str,
}

/// Mints the short-lived ES256 bearer token that authenticates our own calls
/// to the App Store Server API.
pub(crate) struct BearerTokenMinter {
    encoding_key: EncodingKey,
    key_id: String,
    issuer_id: String,
    bundle_id: String,
}

impl BearerTokenMinter {
    /// `private_key_pem` is the PKCS#8 key downloaded from App Store Connect.
    pub(crate) fn new(
        private_key_pem: &str,
        key_id: &str,
        issuer_id: &str,
        bundle_id: &str,
    ) -> Result<Self, AppStoreError> {
        let encoding_key = EncodingKey::from_ec_pem(private_key_pem.as_bytes())
            .map_err(|e| AppStoreError::TokenMint(format!("invalid private key; {e:?}")))?;
        Ok(Self {
            encoding_key,
            key_id: key_id.to_owned(),
            issuer_id: issuer_id.to_owned(),
            bundle_id: bundle_id.to_owned(),
        })
    }

    pub(crate) fn mint(&self, now: DateTime<Utc>) -> Result<String, AppStoreError> {
        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.key_id.clone());
        let claims = Claims {
            iss: &self.issuer_id,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(TOKEN_LIFETIME_MINUTES)).timestamp(),
            aud: AUDIENCE,
            bid: &self.bundle_id,
        };
        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .map_err(|e| AppStoreError::TokenMint(format!("{e:?}")))
    }
}
