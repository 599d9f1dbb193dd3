use serde::Deserialize;

use crate::{
    data::verification::decode_protocol::{DecodeVerified, SignedItemCollector},
    domain::entities::signed_slot::SignedSlot,
};

use super::{
    common::{AppleIdType, Environment, JwsTransaction},
    jws_transaction_decoded_payload_model::JwsTransactionDecodedPayloadModel,
};

/// A page of a customer's transaction history.
///
/// https://developer.apple.com/documentation/appstoreserverapi/historyresponse
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoryResponseModel {
    pub app_apple_id: Option<AppleIdType>,
    pub bundle_id: String,
    pub environment: Option<Environment>,
    /// Whether more pages are available. Pass `revision` to fetch the next one.
    pub has_more: bool,
    pub revision: String,
    pub signed_transactions: Vec<JwsTransaction>,

    /// Same length and order as `signed_transactions`.
    #[serde(skip)]
    pub transactions: Vec<SignedSlot<JwsTransactionDecodedPayloadModel>>,
}

impl DecodeVerified for HistoryResponseModel {
    fn decode_signed_fields(&mut self, collector: &mut SignedItemCollector<'_>) {
        self.transactions = collector.decode_list("signedTransactions", &self.signed_transactions);
    }
}
