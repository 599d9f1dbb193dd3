use serde::Deserialize;

use crate::{
    data::verification::decode_protocol::{DecodeVerified, SignedItemCollector},
    domain::entities::signed_slot::SignedSlot,
};

use super::{
    common::JwsTransaction, jws_transaction_decoded_payload_model::JwsTransactionDecodedPayloadModel,
};

/// Response of Get Transaction Info.
///
/// https://developer.apple.com/documentation/appstoreserverapi/transactioninforesponse
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransactionInfoResponseModel {
    pub signed_transaction_info: JwsTransaction,

    #[serde(skip)]
    pub transaction_info: SignedSlot<JwsTransactionDecodedPayloadModel>,
}

impl DecodeVerified for TransactionInfoResponseModel {
    fn decode_signed_fields(&mut self, collector: &mut SignedItemCollector<'_>) {
        self.transaction_info =
            collector.decode("signedTransactionInfo", &[], &self.signed_transaction_info);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{data::verification::test_support::TestPki, errors::JwsError};

    #[test]
    fn test_decode_single_transaction() {
        let pki = TestPki::generate();
        let token = pki.sign(&json!({"transactionId": "42", "quantity": 1}));
        let raw = json!({ "signedTransactionInfo": token }).to_string();

        let outcome =
            TransactionInfoResponseModel::decode_verified(raw.as_bytes(), &pki.verifier()).unwrap();
        assert!(outcome.is_complete());
        let transaction = outcome.response.transaction_info.value().unwrap();
        assert_eq!(transaction.transaction_id, "42");
        assert_eq!(transaction.quantity, 1);
    }

    #[test]
    fn test_empty_required_token_is_a_failure() {
        let pki = TestPki::generate();
        let outcome = TransactionInfoResponseModel::decode_verified(
            br#"{"signedTransactionInfo":""}"#,
            &pki.verifier(),
        )
        .unwrap();
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(
            outcome.response.transaction_info.error(),
            Some(JwsError::MalformedToken(_))
        ));
    }
}
