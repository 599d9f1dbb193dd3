use serde::Deserialize;

use crate::{
    data::verification::decode_protocol::{DecodeVerified, SignedItemCollector},
    domain::entities::signed_slot::SignedSlot,
};

use super::{
    common::{AppleIdType, Environment, JwsRenewalInfo, JwsTransaction, SubscriptionStatus},
    jws_renewal_info_decoded_payload_model::JwsRenewalInfoDecodedPayloadModel,
    jws_transaction_decoded_payload_model::JwsTransactionDecodedPayloadModel,
};

/// Statuses of all of a customer's auto-renewable subscriptions, grouped by
/// subscription group.
///
/// https://developer.apple.com/documentation/appstoreserverapi/statusresponse
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusResponseModel {
    pub data: Vec<SubscriptionGroupIdentifierItem>,
    pub environment: Option<Environment>,
    pub app_apple_id: Option<AppleIdType>,
    pub bundle_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubscriptionGroupIdentifierItem {
    pub subscription_group_identifier: String,
    pub last_transactions: Vec<LastTransactionsItem>,
}

/// The most recent signed transaction and renewal info for one subscription.
/// Either token may be missing or empty, which leaves its slot `Absent`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LastTransactionsItem {
    pub original_transaction_id: String,
    pub status: Option<SubscriptionStatus>,
    pub signed_renewal_info: Option<JwsRenewalInfo>,
    pub signed_transaction_info: Option<JwsTransaction>,

    #[serde(skip)]
    pub renewal_info: SignedSlot<JwsRenewalInfoDecodedPayloadModel>,
    #[serde(skip)]
    pub transaction_info: SignedSlot<JwsTransactionDecodedPayloadModel>,
}

impl DecodeVerified for StatusResponseModel {
    fn decode_signed_fields(&mut self, collector: &mut SignedItemCollector<'_>) {
        for (group_index, group) in self.data.iter_mut().enumerate() {
            for (index, item) in group.last_transactions.iter_mut().enumerate() {
                let position = [group_index, index];
                item.renewal_info = collector.decode_optional(
                    "signedRenewalInfo",
                    &position,
                    item.signed_renewal_info.as_deref(),
                );
                item.transaction_info = collector.decode_optional(
                    "signedTransactionInfo",
                    &position,
                    item.signed_transaction_info.as_deref(),
                );
            }
        }
    }
}
