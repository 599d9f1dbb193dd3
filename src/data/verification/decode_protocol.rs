//! The decode contract shared by every App Store Server API response.
//!
//! A response envelope is plain JSON. Some of its fields are compact JWS
//! tokens whose decoded shape is fixed by the field. Envelope errors are
//! fatal; a bad token only fails its own slot and is recorded, so the rest of
//! the response stays usable.

use serde::de::DeserializeOwned;

use crate::{
    domain::entities::{
        decode_outcome::{DecodeOutcome, SignedFieldRole, SignedItemError},
        signed_slot::SignedSlot,
    },
    errors::{AppStoreError, JwsError},
};

use super::jws_verifier::JwsVerifier;

/// A payload shape carried inside a signed field.
pub trait SignedPayload: DeserializeOwned {
    const ROLE: SignedFieldRole;

    /// Self-check run after decoding. Currently a no-op for every payload.
    fn validate(&self) -> Result<(), JwsError> {
        Ok(())
    }

    /// Decodes signed fields nested inside this payload. `position` locates
    /// the payload itself within the enclosing response.
    fn decode_nested(&mut self, _collector: &mut SignedItemCollector<'_>, _position: &[usize]) {}
}

/// Implemented by every response envelope.
pub trait DecodeVerified: DeserializeOwned {
    /// Populates the decoded counterpart of each signed field.
    fn decode_signed_fields(&mut self, _collector: &mut SignedItemCollector<'_>) {}

    fn decode_verified(
        raw: &[u8],
        verifier: &JwsVerifier,
    ) -> Result<DecodeOutcome<Self>, AppStoreError> {
        let mut response: Self = decode_envelope(raw)?;
        let mut collector = SignedItemCollector::new(verifier);
        response.decode_signed_fields(&mut collector);
        Ok(collector.finish(response))
    }
}

pub(crate) fn decode_envelope<R: DeserializeOwned>(raw: &[u8]) -> Result<R, AppStoreError> {
    serde_json::from_slice(raw).map_err(|e| AppStoreError::EnvelopeDecode(e.to_string()))
}

/// Verifies signed fields one at a time, accumulating failures instead of
/// stopping at the first one.
pub struct SignedItemCollector<'a> {
    verifier: &'a JwsVerifier,
    failures: Vec<SignedItemError>,
}

impl<'a> SignedItemCollector<'a> {
    pub fn new(verifier: &'a JwsVerifier) -> Self {
        Self {
            verifier,
            failures: Vec::new(),
        }
    }

    /// Decodes a field that must be present. An empty token is a failure.
    pub fn decode<T: SignedPayload>(
        &mut self,
        field: &'static str,
        position: &[usize],
        token: &str,
    ) -> SignedSlot<T> {
        match self.verifier.verify_and_decode::<T>(token) {
            Ok(mut value) => {
                value.decode_nested(self, position);
                SignedSlot::Verified(value)
            }
            Err(cause) => {
                tracing::warn!(
                    field,
                    ?position,
                    role = T::ROLE.as_str(),
                    error = %cause,
                    "signed item failed to decode"
                );
                self.failures.push(SignedItemError {
                    field,
                    role: T::ROLE,
                    position: position.to_vec(),
                    cause: cause.clone(),
                });
                SignedSlot::Failed(cause)
            }
        }
    }

    /// Decodes a field the platform may omit. Missing and empty tokens yield
    /// `Absent` without recording a failure.
    pub fn decode_optional<T: SignedPayload>(
        &mut self,
        field: &'static str,
        position: &[usize],
        token: Option<&str>,
    ) -> SignedSlot<T> {
        match token {
            Some(token) if !token.is_empty() => self.decode(field, position, token),
            _ => SignedSlot::Absent,
        }
    }

    /// Decodes a list of tokens into slots of the same length and order.
    pub fn decode_list<T: SignedPayload>(
        &mut self,
        field: &'static str,
        tokens: &[String],
    ) -> Vec<SignedSlot<T>> {
        tokens
            .iter()
            .enumerate()
            .map(|(index, token)| self.decode(field, &[index], token))
            .collect()
    }

    pub fn finish<R>(self, response: R) -> DecodeOutcome<R> {
        DecodeOutcome {
            response,
            failures: self.failures,
        }
    }
}
