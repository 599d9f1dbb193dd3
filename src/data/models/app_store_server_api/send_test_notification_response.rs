use serde::Deserialize;

use crate::{
    data::{
        models::app_store_server_notifications::response_body_v2_decoded_payload_model::ResponseBodyV2DecodedPayloadModel,
        verification::decode_protocol::{DecodeVerified, SignedItemCollector},
    },
    domain::entities::signed_slot::SignedSlot,
};

use super::common::{JwsNotification, SendAttemptItemModel, SendAttemptResult};

/// Response of Request a Test Notification.
///
/// https://developer.apple.com/documentation/appstoreserverapi/sendtestnotificationresponse
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SendTestNotificationResponseModel {
    /// Pass to Get Test Notification Status.
    pub test_notification_token: String,
}

/// Delivery status of a test notification, with the notification itself.
///
/// https://developer.apple.com/documentation/appstoreserverapi/checktestnotificationresponse
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckTestNotificationResponseModel {
    pub first_send_attempt_result: Option<SendAttemptResult>,
    pub send_attempts: Vec<SendAttemptItemModel>,
    pub signed_payload: JwsNotification,

    #[serde(skip)]
    pub payload: SignedSlot<ResponseBodyV2DecodedPayloadModel>,
}

impl DecodeVerified for CheckTestNotificationResponseModel {
    fn decode_signed_fields(&mut self, collector: &mut SignedItemCollector<'_>) {
        self.payload = collector.decode("signedPayload", &[], &self.signed_payload);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::{
        models::app_store_server_notifications::response_body_v2_decoded_payload_model::NotificationType,
        verification::test_support::TestPki,
    };

    #[test]
    fn test_decodes_test_notification_payload() {
        let pki = TestPki::generate();
        let raw = json!({
            "signedPayload": pki.sign(&json!({
                "notificationType": "TEST",
                "notificationUUID": "3838df56-31ab-4e2f-9535-e4e3a3c1b36f",
                "version": "2.0",
                "signedDate": 1695900000000i64,
                "data": { "bundleId": "com.example.app", "environment": "Sandbox" },
            })),
            "sendAttempts": [
                { "attemptDate": 1695900001000i64, "sendAttemptResult": "SUCCESS" },
            ],
        })
        .to_string();

        let outcome =
            CheckTestNotificationResponseModel::decode_verified(raw.as_bytes(), &pki.verifier())
                .unwrap();
        assert!(outcome.is_complete());
        let response = outcome.response;
        assert_eq!(
            response.send_attempts[0].send_attempt_result,
            Some(SendAttemptResult::Success)
        );
        let payload = response.payload.value().unwrap();
        assert_eq!(payload.notification_type, Some(NotificationType::Test));
        let data = payload.data.as_ref().unwrap();
        // A TEST notification carries no signed transaction or renewal info.
        assert!(data.transaction_info.is_absent());
        assert!(data.renewal_info.is_absent());
    }
}
