use serde::Deserialize;

/// Body the App Store Server API returns alongside a non-success status.
///
/// https://developer.apple.com/documentation/appstoreserverapi/error_codes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponseModel {
    pub error_code: i64,
    pub error_message: String,
}
