//! Throwaway P-256 certificate hierarchies and token signing for tests.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};
use openssl::{
    asn1::Asn1Time,
    bn::BigNum,
    ec::{EcGroup, EcKey},
    ecdsa::EcdsaSig,
    hash::MessageDigest,
    nid::Nid,
    pkey::{PKey, Private},
    x509::{
        extension::{BasicConstraints, KeyUsage},
        X509Builder, X509NameBuilder, X509,
    },
};
use serde_json::{json, Value};

use super::{jws_verifier::JwsVerifier, trust_store::TrustStore};

static NEXT_SERIAL: AtomicU32 = AtomicU32::new(1);

const HOUR: i64 = 3600;
const YEAR: i64 = 365 * 24 * HOUR;

pub(crate) struct TestPki {
    pub(crate) root: X509,
    pub(crate) intermediate: X509,
    pub(crate) intermediate_key: PKey<Private>,
    pub(crate) leaf: X509,
    pub(crate) leaf_key: PKey<Private>,
}

impl TestPki {
    pub(crate) fn generate() -> Self {
        let id = NEXT_SERIAL.fetch_add(3, Ordering::Relaxed);
        let root_key = ec_key();
        let root = issue(&format!("Test Root {id}"), &root_key, None, true, id, (-HOUR, YEAR));
        let intermediate_key = ec_key();
        let intermediate = issue(
            &format!("Test Intermediate {id}"),
            &intermediate_key,
            Some((&root, &root_key)),
            true,
            id + 1,
            (-HOUR, YEAR),
        );
        let leaf_key = ec_key();
        let leaf = issue(
            &format!("Test Signer {id}"),
            &leaf_key,
            Some((&intermediate, &intermediate_key)),
            false,
            id + 2,
            (-HOUR, YEAR),
        );
        Self {
            root,
            intermediate,
            intermediate_key,
            leaf,
            leaf_key,
        }
    }

    /// Issues another leaf for `key` under this intermediate, valid from
    /// `not_before` to `not_after` seconds relative to now.
    pub(crate) fn issue_leaf(&self, key: &PKey<Private>, not_before: i64, not_after: i64) -> X509 {
        let serial = NEXT_SERIAL.fetch_add(1, Ordering::Relaxed);
        issue(
            &format!("Test Signer {serial}"),
            key,
            Some((&self.intermediate, &self.intermediate_key)),
            false,
            serial,
            (not_before, not_after),
        )
    }

    /// The `x5c` header with `leaf` in place of the default signer.
    pub(crate) fn header_for(&self, leaf: &X509) -> Value {
        json!({
            "alg": "ES256",
            "x5c": [
                STANDARD.encode(leaf.to_der().unwrap()),
                STANDARD.encode(self.intermediate.to_der().unwrap()),
                STANDARD.encode(self.root.to_der().unwrap()),
            ],
        })
    }

    pub(crate) fn trust_store(&self) -> TrustStore {
        TrustStore::load(
            &self.intermediate.to_der().unwrap(),
            &self.root.to_der().unwrap(),
        )
        .unwrap()
    }

    pub(crate) fn verifier(&self) -> JwsVerifier {
        JwsVerifier::new(Arc::new(self.trust_store()))
    }

    /// The header the App Store sends: leaf, intermediate and root in `x5c`.
    pub(crate) fn header(&self) -> Value {
        self.header_for(&self.leaf)
    }

    pub(crate) fn sign(&self, payload: &Value) -> String {
        self.sign_raw(&self.header(), payload.to_string().as_bytes())
    }

    pub(crate) fn sign_raw(&self, header: &Value, payload: &[u8]) -> String {
        sign_compact(header.to_string().as_bytes(), payload, &self.leaf_key)
    }
}

pub(crate) fn sign_compact(header: &[u8], payload: &[u8], key: &PKey<Private>) -> String {
    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(payload)
    );
    let digest = openssl::sha::sha256(signing_input.as_bytes());
    let signature = EcdsaSig::sign(&digest, &key.ec_key().unwrap()).unwrap();
    let mut raw = signature.r().to_vec_padded(32).unwrap();
    raw.extend(signature.s().to_vec_padded(32).unwrap());
    format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(raw))
}

pub(crate) fn ec_key() -> PKey<Private> {
    ec_key_on(Nid::X9_62_PRIME256V1)
}

pub(crate) fn ec_key_on(curve: Nid) -> PKey<Private> {
    let group = EcGroup::from_curve_name(curve).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn issue(
    common_name: &str,
    key: &PKey<Private>,
    issuer: Option<(&X509, &PKey<Private>)>,
    is_ca: bool,
    serial: u32,
    (not_before, not_after): (i64, i64),
) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", common_name).unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&BigNum::from_u32(serial).unwrap().to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    match issuer {
        Some((issuer_cert, _)) => builder.set_issuer_name(issuer_cert.subject_name()).unwrap(),
        None => builder.set_issuer_name(&name).unwrap(),
    }
    builder.set_pubkey(key).unwrap();
    let now = chrono::Utc::now().timestamp();
    builder
        .set_not_before(&Asn1Time::from_unix(now + not_before).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::from_unix(now + not_after).unwrap())
        .unwrap();
    if is_ca {
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .key_cert_sign()
                    .crl_sign()
                    .build()
                    .unwrap(),
            )
            .unwrap();
    } else {
        builder
            .append_extension(BasicConstraints::new().build().unwrap())
            .unwrap();
        builder
            .append_extension(KeyUsage::new().digital_signature().build().unwrap())
            .unwrap();
    }
    let signing_key = issuer.map_or(key, |(_, issuer_key)| issuer_key);
    builder.sign(signing_key, MessageDigest::sha256()).unwrap();
    builder.build()
}
