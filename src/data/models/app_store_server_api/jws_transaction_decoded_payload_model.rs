use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::{
    data::verification::decode_protocol::SignedPayload,
    domain::entities::decode_outcome::SignedFieldRole,
};

use super::{
    common::{Environment, OfferDiscountType, OfferType},
    millis_timestamp,
};

/// A single purchase, renewal or revocation, as carried in
/// `signedTransactionInfo` and `signedTransactions`.
///
/// https://developer.apple.com/documentation/appstoreserverapi/jwstransactiondecodedpayload
///
/// Every field is optional on the wire. Missing strings decode as empty,
/// numbers as zero and timestamps as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JwsTransactionDecodedPayloadModel {
    /// The UUID the app attached at purchase time, if any.
    pub app_account_token: Option<String>,
    pub bundle_id: String,
    /// ISO 4217 code for `price`.
    pub currency: Option<String>,
    pub environment: Option<Environment>,
    /// Subscriptions only.
    #[serde(with = "millis_timestamp")]
    pub expires_date: Option<DateTime<Utc>>,
    pub in_app_ownership_type: Option<InAppOwnershipType>,
    /// The customer moved to a higher tier; this transaction no longer grants
    /// access.
    pub is_upgraded: bool,
    pub offer_discount_type: Option<OfferDiscountType>,
    pub offer_identifier: Option<String>,
    pub offer_type: Option<OfferType>,
    #[serde(with = "millis_timestamp")]
    pub original_purchase_date: Option<DateTime<Utc>>,
    pub original_transaction_id: String,
    /// In milliunits of `currency`.
    pub price: Option<i64>,
    pub product_id: String,
    #[serde(with = "millis_timestamp")]
    pub purchase_date: Option<DateTime<Utc>>,
    pub quantity: i32,
    /// Set when the purchase was refunded or revoked from Family Sharing.
    #[serde(with = "millis_timestamp")]
    pub revocation_date: Option<DateTime<Utc>>,
    pub revocation_reason: Option<RevocationReason>,
    #[serde(with = "millis_timestamp")]
    pub signed_date: Option<DateTime<Utc>>,
    /// Alpha-3 storefront country code.
    pub storefront: Option<String>,
    pub storefront_id: Option<String>,
    pub subscription_group_identifier: Option<String>,
    pub transaction_id: String,
    pub transaction_reason: Option<TransactionReason>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub web_order_line_item_id: Option<String>,
}

impl SignedPayload for JwsTransactionDecodedPayloadModel {
    const ROLE: SignedFieldRole = SignedFieldRole::Transaction;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InAppOwnershipType {
    FamilyShared,
    Purchased,

    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum RevocationReason {
    /// Refunded for a reason unrelated to the app, e.g. an accidental
    /// purchase.
    Other = 0,
    /// Refunded because of a problem with the app.
    Issue = 1,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionReason {
    Purchase,
    /// Initiated by the App Store to renew a subscription.
    Renewal,

    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "Auto-Renewable Subscription")]
    AutoRenewableSubscription,
    #[serde(rename = "Non-Consumable")]
    NonConsumable,
    #[serde(rename = "Consumable")]
    Consumable,
    #[serde(rename = "Non-Renewing Subscription")]
    NonRenewableSubscription,

    #[serde(untagged)]
    Unknown(String),
}
