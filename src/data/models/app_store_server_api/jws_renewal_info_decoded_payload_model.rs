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

/// Renewal state of an auto-renewable subscription, as carried in
/// `signedRenewalInfo`.
///
/// https://developer.apple.com/documentation/appstoreserverapi/jwsrenewalinfodecodedpayload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JwsRenewalInfoDecodedPayloadModel {
    /// Product the subscription will renew into; differs from `product_id`
    /// after a pending up/downgrade.
    pub auto_renew_product_id: String,
    pub auto_renew_status: Option<AutoRenewStatus>,
    /// ISO 4217 code for `renewal_price`.
    pub currency: Option<String>,
    pub eligible_win_back_offer_ids: Vec<String>,
    pub environment: Option<Environment>,
    /// Set once the subscription has lapsed.
    pub expiration_intent: Option<ExpirationIntent>,
    #[serde(with = "millis_timestamp")]
    pub grace_period_expires_date: Option<DateTime<Utc>>,
    /// Apple is still retrying payment for a lapsed subscription.
    pub is_in_billing_retry_period: bool,
    pub offer_discount_type: Option<OfferDiscountType>,
    pub offer_identifier: Option<String>,
    pub offer_type: Option<OfferType>,
    pub original_transaction_id: String,
    pub price_increase_status: Option<PriceIncreaseStatus>,
    pub product_id: String,
    /// Start of the current run of paid service, bridging lapses of up to
    /// 60 days.
    #[serde(with = "millis_timestamp")]
    pub recent_subscription_start_date: Option<DateTime<Utc>>,
    #[serde(with = "millis_timestamp")]
    pub renewal_date: Option<DateTime<Utc>>,
    /// In milliunits of `currency`.
    pub renewal_price: Option<i64>,
    #[serde(with = "millis_timestamp")]
    pub signed_date: Option<DateTime<Utc>>,
}

impl SignedPayload for JwsRenewalInfoDecodedPayloadModel {
    const ROLE: SignedFieldRole = SignedFieldRole::RenewalInfo;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum AutoRenewStatus {
    Off = 0,
    On = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ExpirationIntent {
    VoluntaryCancellation = 1,
    BillingError = 2,
    /// The customer did not consent to a price increase.
    PriceIncreaseDecline = 3,
    ProductUnavailable = 4,
    Other = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum PriceIncreaseStatus {
    NoActionTaken = 0,
    /// Consent was given, or the increase did not need consent.
    CustomerConsented = 1,
}
