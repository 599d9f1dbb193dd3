use serde::Serialize;
use serde_repr::Serialize_repr;

/// Consumption information sent in reply to a CONSUMPTION_REQUEST
/// notification.
///
/// https://developer.apple.com/documentation/appstoreserverapi/consumptionrequest
///
/// Integer fields without a dedicated enum carry Apple's documented range
/// codes, with 0 meaning "undeclared".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionRequest {
    pub account_tenure: u8,
    /// The UUID your app attached to the purchase, or an empty string.
    pub app_account_token: String,
    pub consumption_status: ConsumptionStatus,
    pub customer_consented: bool,
    pub delivery_status: DeliveryStatus,
    pub lifetime_dollars_purchased: u8,
    pub lifetime_dollars_refunded: u8,
    pub platform: Platform,
    pub play_time: u8,
    pub sample_content_provided: bool,
    pub user_status: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr)]
#[repr(u8)]
pub enum ConsumptionStatus {
    Undeclared = 0,
    NotConsumed = 1,
    PartiallyConsumed = 2,
    FullyConsumed = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr)]
#[repr(u8)]
pub enum DeliveryStatus {
    DeliveredAndWorking = 0,
    DidNotDeliverQualityIssue = 1,
    DeliveredWrongItem = 2,
    DidNotDeliverServerOutage = 3,
    DidNotDeliverCurrencyChange = 4,
    DidNotDeliverOtherReason = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr)]
#[repr(u8)]
pub enum Platform {
    Undeclared = 0,
    Apple = 1,
    NonApple = 2,
}
