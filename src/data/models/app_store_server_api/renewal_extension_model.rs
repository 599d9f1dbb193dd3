use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::Serialize_repr;
use serde_with::skip_serializing_none;

use super::millis_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr)]
#[repr(u8)]
pub enum ExtendReasonCode {
    Undeclared = 0,
    CustomerSatisfaction = 1,
    OtherReasons = 2,
    ServiceIssueOrOutage = 3,
}

/// https://developer.apple.com/documentation/appstoreserverapi/extendrenewaldaterequest
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendRenewalDateRequest {
    /// Number of days to extend by, at most 90.
    pub extend_by_days: u8,
    pub extend_reason_code: ExtendReasonCode,
    /// A string you provide that uniquely identifies this request.
    pub request_identifier: String,
}

/// https://developer.apple.com/documentation/appstoreserverapi/extendrenewaldateresponse
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtendRenewalDateResponseModel {
    /// The new expiration date of the subscription.
    #[serde(with = "millis_timestamp")]
    pub effective_date: Option<DateTime<Utc>>,
    pub original_transaction_id: String,
    pub success: bool,
    pub web_order_line_item_id: String,
}

/// https://developer.apple.com/documentation/appstoreserverapi/massextendrenewaldaterequest
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MassExtendRenewalDateRequest {
    pub request_identifier: String,
    pub extend_by_days: u8,
    pub extend_reason_code: ExtendReasonCode,
    pub product_id: String,
    /// Limits the extension to these storefronts. `None` means all.
    pub storefront_country_codes: Option<Vec<String>>,
}

/// https://developer.apple.com/documentation/appstoreserverapi/massextendrenewaldateresponse
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MassExtendRenewalDateResponseModel {
    pub request_identifier: String,
}

/// https://developer.apple.com/documentation/appstoreserverapi/massextendrenewaldatestatusresponse
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MassExtendRenewalDateStatusResponseModel {
    pub request_identifier: String,
    pub complete: bool,
    #[serde(with = "millis_timestamp")]
    pub complete_date: Option<DateTime<Utc>>,
    pub failed_count: i64,
    pub succeeded_count: i64,
}
