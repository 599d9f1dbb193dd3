use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::millis_timestamp;

/// Raw compact JWS tokens, as they appear in response envelopes.
pub type JwsTransaction = String;
pub type JwsRenewalInfo = String;
pub type JwsNotification = String;

pub type AppleIdType = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Sandbox,
    Production,

    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferDiscountType {
    FreeTrial,
    /// Discounted price charged for one or more billing periods.
    PayAsYouGo,
    PayUpFront,

    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum OfferType {
    Introductory = 1,
    Promotional = 2,
    OfferCode = 3,
    WinBack = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum SubscriptionStatus {
    Active = 1,
    Expired = 2,
    BillingRetry = 3,
    /// Payment failed but service should continue until the grace period
    /// ends.
    BillingGracePeriod = 4,
    Revoked = 5,
}

/// The result of one attempt to deliver a notification to your server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendAttemptResult {
    Success,
    TimedOut,
    TlsIssue,
    CircularRedirect,
    NoResponse,
    SocketIssue,
    UnsupportedCharset,
    InvalidResponse,
    PrematureClose,
    UnsuccessfulHttpResponseCode,
    Other,

    #[serde(untagged)]
    Unknown(String),
}

/// One delivery attempt of a notification.
///
/// https://developer.apple.com/documentation/appstoreserverapi/sendattemptitem
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SendAttemptItemModel {
    #[serde(with = "millis_timestamp")]
    pub attempt_date: Option<DateTime<Utc>>,
    pub send_attempt_result: Option<SendAttemptResult>,
}
