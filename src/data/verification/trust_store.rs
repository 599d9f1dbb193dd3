use std::fmt;

use openssl::{
    stack::Stack,
    x509::{
        store::{X509Store, X509StoreBuilder},
        X509Ref, X509StoreContext, X509,
    },
};

use crate::errors::{AppStoreError, JwsError};

/// The pinned Apple intermediate and root certificates.
///
/// Only the root is a trust anchor. The intermediate is offered to chain
/// building alongside whatever certificates a token carries in its `x5c`
/// header. Read-only after `load`, so one instance can serve any number of
/// concurrent verifications.
pub struct TrustStore {
    intermediate: X509,
    root: X509,
    store: X509Store,
}

impl TrustStore {
    /// Builds the trust store from PEM or DER encoded certificates.
    pub fn load(intermediate: &[u8], root: &[u8]) -> Result<Self, AppStoreError> {
        let intermediate =
            parse_certificate(intermediate).map_err(|reason| AppStoreError::CertificateLoad {
                which: "intermediate",
                reason,
            })?;
        let root = parse_certificate(root).map_err(|reason| AppStoreError::CertificateLoad {
            which: "root",
            reason,
        })?;
        let store = build_store(&root).map_err(|e| AppStoreError::CertificateLoad {
            which: "root",
            reason: e.to_string(),
        })?;
        Ok(Self {
            intermediate,
            root,
            store,
        })
    }

    pub fn intermediate(&self) -> &X509Ref {
        &self.intermediate
    }

    pub fn root(&self) -> &X509Ref {
        &self.root
    }

    /// Checks that `leaf` chains to the pinned root, using `presented` (the
    /// remaining `x5c` entries) and the pinned intermediate as candidate
    /// issuers. Standard X.509 validity only: signatures, validity periods and
    /// CA constraints.
    pub(crate) fn verify_chain(&self, leaf: &X509Ref, presented: &[X509]) -> Result<(), JwsError> {
        let untrusted = |e: openssl::error::ErrorStack| JwsError::UntrustedCertificate(e.to_string());

        let mut candidates = Stack::new().map_err(untrusted)?;
        for certificate in presented {
            candidates.push(certificate.clone()).map_err(untrusted)?;
        }
        candidates
            .push(self.intermediate.clone())
            .map_err(untrusted)?;

        let mut context = X509StoreContext::new().map_err(untrusted)?;
        let outcome = context
            .init(&self.store, leaf, &candidates, |c| {
                Ok(if c.verify_cert()? {
                    Ok(())
                } else {
                    Err(c.error())
                })
            })
            .map_err(untrusted)?;
        outcome.map_err(|result| JwsError::UntrustedCertificate(result.error_string().to_owned()))
    }
}

impl fmt::Debug for TrustStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustStore")
            .field("intermediate", &self.intermediate)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

fn parse_certificate(bytes: &[u8]) -> Result<X509, String> {
    let is_pem = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map_or(false, |start| bytes[start..].starts_with(b"-----BEGIN"));
    let parsed = if is_pem {
        X509::from_pem(bytes)
    } else {
        X509::from_der(bytes)
    };
    parsed.map_err(|e| e.to_string())
}

fn build_store(root: &X509) -> Result<X509Store, openssl::error::ErrorStack> {
    let mut builder = X509StoreBuilder::new()?;
    builder.add_cert(root.clone())?;
    Ok(builder.build())
}
