use serde::Deserialize;

use crate::data::models::app_store_server_api::common::JwsNotification;

/// The POST body Apple sends to the notification endpoint.
///
/// https://developer.apple.com/documentation/appstoreservernotifications/responsebodyv2
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBodyV2Model {
    pub signed_payload: JwsNotification,
}
