use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    data::{
        models::app_store_server_api::{
            common::{AppleIdType, Environment, JwsRenewalInfo, JwsTransaction, SubscriptionStatus},
            jws_renewal_info_decoded_payload_model::JwsRenewalInfoDecodedPayloadModel,
            jws_transaction_decoded_payload_model::JwsTransactionDecodedPayloadModel,
            millis_timestamp,
        },
        verification::decode_protocol::{SignedItemCollector, SignedPayload},
    },
    domain::{entities::decode_outcome::SignedFieldRole, entities::signed_slot::SignedSlot},
};

/// A decoded notification `signedPayload`. Delivered by Server Notifications
/// V2 and also returned from the notification history and test notification
/// endpoints.
///
/// https://developer.apple.com/documentation/appstoreservernotifications/responsebodyv2decodedpayload
///
/// The platform promises that at most one of `data`, `summary` and
/// `external_purchase_token` is present, but nothing on the wire enforces it,
/// so all three are kept as independent options.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseBodyV2DecodedPayloadModel {
    pub notification_type: Option<NotificationType>,
    /// Further detail on the event, present only for some notification types.
    pub subtype: Option<NotificationSubtype>,
    /// App metadata plus signed renewal and transaction information.
    pub data: Option<NotificationData>,
    /// Result of a mass renewal-date extension request.
    pub summary: Option<NotificationSummary>,
    /// Present when the notification type is EXTERNAL_PURCHASE_TOKEN.
    pub external_purchase_token: Option<ExternalPurchaseToken>,
    /// "2.0".
    pub version: String,
    /// The time that the App Store signed the payload.
    #[serde(with = "millis_timestamp")]
    pub signed_date: Option<DateTime<Utc>>,
    /// Unique identifier of the notification, usable to detect duplicates.
    #[serde(rename = "notificationUUID")]
    pub notification_uuid: String,
}

impl ResponseBodyV2DecodedPayloadModel {
    fn populated_sections(&self) -> usize {
        [
            self.data.is_some(),
            self.summary.is_some(),
            self.external_purchase_token.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

impl SignedPayload for ResponseBodyV2DecodedPayloadModel {
    const ROLE: SignedFieldRole = SignedFieldRole::Notification;

    fn decode_nested(&mut self, collector: &mut SignedItemCollector<'_>, position: &[usize]) {
        if self.populated_sections() > 1 {
            tracing::warn!(
                notification_uuid = %self.notification_uuid,
                "notification carries more than one of data, summary and externalPurchaseToken"
            );
        }
        if let Some(data) = self.data.as_mut() {
            data.transaction_info = collector.decode_optional(
                "signedTransactionInfo",
                position,
                data.signed_transaction_info.as_deref(),
            );
            data.renewal_info = collector.decode_optional(
                "signedRenewalInfo",
                position,
                data.signed_renewal_info.as_deref(),
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// The customer subscribed (INITIAL_BUY) or resubscribed (RESUBSCRIBE).
    Subscribed,
    /// The customer changed their subscription plan (UPGRADE / DOWNGRADE), or
    /// cancelled a pending downgrade when no subtype is set.
    DidChangeRenewalPref,
    /// Auto-renewal was enabled or disabled.
    DidChangeRenewalStatus,
    /// A customer with an active subscription redeemed an offer.
    OfferRedeemed,
    /// The subscription renewed, possibly after a billing failure
    /// (BILLING_RECOVERY).
    DidRenew,
    /// The subscription expired; the subtype gives the reason.
    Expired,
    /// Renewal failed because of a billing issue. With GRACE_PERIOD, keep
    /// providing service.
    DidFailToRenew,
    /// The billing grace period ended without a renewal.
    GracePeriodExpired,
    /// The customer was informed of a price increase (PENDING / ACCEPTED).
    PriceIncrease,
    /// The App Store refunded a transaction.
    Refund,
    /// The App Store declined a refund request.
    RefundDeclined,
    /// A previously granted refund was reversed after a dispute.
    RefundReversed,
    /// The renewal date of a single subscription was extended.
    RenewalExtended,
    /// Progress of a mass renewal-date extension (SUMMARY / FAILURE).
    RenewalExtension,
    /// Family Sharing access to a purchase was revoked.
    Revoke,
    /// Sent in response to the Request a Test Notification endpoint.
    Test,
    /// An external purchase token was created but not reported (UNREPORTED).
    ExternalPurchaseToken,
    /// The customer bought a consumable, non-consumable or non-renewing
    /// subscription.
    OneTimeCharge,
    /// The customer requested a refund and the App Store wants consumption
    /// data.
    ConsumptionRequest,

    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationSubtype {
    InitialBuy,
    Resubscribe,
    Downgrade,
    Upgrade,
    AutoRenewEnabled,
    AutoRenewDisabled,
    Voluntary,
    BillingRetry,
    PriceIncrease,
    GracePeriod,
    Pending,
    Accepted,
    BillingRecovery,
    ProductNotForSale,
    /// The mass renewal-date extension completed; see `summary`.
    Summary,
    /// The renewal-date extension failed for one subscription; see `data`.
    Failure,
    Unreported,

    #[serde(untagged)]
    Unknown(String),
}

/// App metadata and the signed renewal and transaction information of a
/// notification.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationData {
    /// The unique identifier of the app. Not present in the sandbox.
    pub app_apple_id: Option<AppleIdType>,
    pub bundle_id: String,
    pub bundle_version: Option<String>,
    /// Only set for CONSUMPTION_REQUEST notifications.
    pub consumption_request_reason: Option<ConsumptionRequestReason>,
    pub environment: Option<Environment>,
    /// Only set for auto-renewable subscriptions.
    pub signed_renewal_info: Option<JwsRenewalInfo>,
    pub signed_transaction_info: Option<JwsTransaction>,
    /// Subscription status as of the payload's `signed_date`.
    pub status: Option<SubscriptionStatus>,

    #[serde(skip)]
    pub renewal_info: SignedSlot<JwsRenewalInfoDecodedPayloadModel>,
    #[serde(skip)]
    pub transaction_info: SignedSlot<JwsTransactionDecodedPayloadModel>,
}

/// Outcome of a mass renewal-date extension, sent with RENEWAL_EXTENSION /
/// SUMMARY.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationSummary {
    /// Matches the requestIdentifier of the mass extension request.
    pub request_identifier: String,
    pub environment: Option<Environment>,
    pub app_apple_id: Option<AppleIdType>,
    pub bundle_id: String,
    pub product_id: String,
    /// Storefronts the extension was limited to. Empty means all storefronts.
    pub storefront_country_codes: Vec<String>,
    pub failed_count: i64,
    pub succeeded_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExternalPurchaseToken {
    /// Identifier to use when reporting the token.
    pub external_purchase_id: String,
    #[serde(with = "millis_timestamp")]
    pub token_creation_date: Option<DateTime<Utc>>,
    pub app_apple_id: Option<AppleIdType>,
    pub bundle_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumptionRequestReason {
    UnintendedPurchase,
    FulfillmentIssue,
    UnsatisfiedWithPurchase,
    Legal,
    Other,

    #[serde(untagged)]
    Unknown(String),
}
