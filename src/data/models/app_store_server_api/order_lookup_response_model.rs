use serde::Deserialize;
use serde_repr::Deserialize_repr;

use crate::{
    data::verification::decode_protocol::{DecodeVerified, SignedItemCollector},
    domain::entities::signed_slot::SignedSlot,
};

use super::{
    common::JwsTransaction, jws_transaction_decoded_payload_model::JwsTransactionDecodedPayloadModel,
};

/// The transactions that belong to a customer's order ID.
///
/// https://developer.apple.com/documentation/appstoreserverapi/orderlookupresponse
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderLookupResponseModel {
    pub status: Option<OrderLookupStatus>,
    pub signed_transactions: Vec<JwsTransaction>,

    /// Same length and order as `signed_transactions`.
    #[serde(skip)]
    pub transactions: Vec<SignedSlot<JwsTransactionDecodedPayloadModel>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr)]
#[repr(u8)]
pub enum OrderLookupStatus {
    /// The order ID is valid.
    Valid = 0,
    /// The order ID is invalid.
    Invalid = 1,
}

impl DecodeVerified for OrderLookupResponseModel {
    fn decode_signed_fields(&mut self, collector: &mut SignedItemCollector<'_>) {
        self.transactions = collector.decode_list("signedTransactions", &self.signed_transactions);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::verification::test_support::TestPki;

    #[test]
    fn test_invalid_order_has_no_transactions() {
        let pki = TestPki::generate();
        let outcome =
            OrderLookupResponseModel::decode_verified(br#"{"status":1}"#, &pki.verifier()).unwrap();
        assert_eq!(outcome.response.status, Some(OrderLookupStatus::Invalid));
        assert!(outcome.response.transactions.is_empty());
    }

    #[test]
    fn test_one_tampered_transaction_out_of_three() {
        let pki = TestPki::generate();
        let good = pki.sign(&json!({ "transactionId": "ok" }));
        let (signed, _) = good.rsplit_once('.').unwrap();
        let other = pki.sign(&json!({ "transactionId": "other" }));
        let (_, other_signature) = other.rsplit_once('.').unwrap();
        let tampered = format!("{signed}.{other_signature}");

        let raw = json!({
            "status": 0,
            "signedTransactions": [good.clone(), tampered, good],
        })
        .to_string();
        let outcome = OrderLookupResponseModel::decode_verified(raw.as_bytes(), &pki.verifier()).unwrap();
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].position, vec![1]);
        let response = outcome.response;
        assert!(response.transactions[0].is_verified());
        assert!(response.transactions[1].is_failed());
        assert!(response.transactions[2].is_verified());
    }
}
