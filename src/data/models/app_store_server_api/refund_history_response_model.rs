use serde::Deserialize;

use crate::{
    data::verification::decode_protocol::{DecodeVerified, SignedItemCollector},
    domain::entities::signed_slot::SignedSlot,
};

use super::{
    common::JwsTransaction, jws_transaction_decoded_payload_model::JwsTransactionDecodedPayloadModel,
};

/// A page of refunded transactions for a customer.
///
/// https://developer.apple.com/documentation/appstoreserverapi/refundhistoryresponse
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefundHistoryResponseModel {
    pub has_more: bool,
    pub revision: String,
    pub signed_transactions: Vec<JwsTransaction>,

    /// Same length and order as `signed_transactions`.
    #[serde(skip)]
    pub transactions: Vec<SignedSlot<JwsTransactionDecodedPayloadModel>>,
}

impl DecodeVerified for RefundHistoryResponseModel {
    fn decode_signed_fields(&mut self, collector: &mut SignedItemCollector<'_>) {
        self.transactions = collector.decode_list("signedTransactions", &self.signed_transactions);
    }
}
