use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{
    data::{
        models::app_store_server_notifications::response_body_v2_decoded_payload_model::{
            NotificationSubtype, NotificationType, ResponseBodyV2DecodedPayloadModel,
        },
        verification::decode_protocol::{DecodeVerified, SignedItemCollector},
    },
    domain::entities::signed_slot::SignedSlot,
};

use super::common::{JwsNotification, SendAttemptItemModel, SendAttemptResult};

/// https://developer.apple.com/documentation/appstoreserverapi/notificationhistoryrequest
///
/// The pagination token of a follow-up page travels in the query string, not
/// in this body.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationHistoryRequest {
    #[serde(with = "ts_milliseconds")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub end_date: DateTime<Utc>,
    pub notification_type: Option<NotificationType>,
    pub notification_subtype: Option<NotificationSubtype>,
    pub original_transaction_id: Option<String>,
    pub only_failures: Option<bool>,
}

impl NotificationHistoryRequest {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        Self {
            start_date,
            end_date,
            notification_type: None,
            notification_subtype: None,
            original_transaction_id: None,
            only_failures: None,
        }
    }

    pub fn with_notification_type(mut self, notification_type: NotificationType) -> Self {
        self.notification_type = Some(notification_type);
        self
    }

    pub fn with_notification_subtype(mut self, subtype: NotificationSubtype) -> Self {
        self.notification_subtype = Some(subtype);
        self
    }

    pub fn with_original_transaction_id(mut self, original_transaction_id: &str) -> Self {
        self.original_transaction_id = Some(original_transaction_id.to_owned());
        self
    }

    pub fn with_only_failures(mut self, only_failures: bool) -> Self {
        self.only_failures = Some(only_failures);
        self
    }
}

/// https://developer.apple.com/documentation/appstoreserverapi/notificationhistoryresponse
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationHistoryResponseModel {
    pub notification_history: Vec<NotificationHistoryResponseItemModel>,
    pub has_more: bool,
    pub pagination_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationHistoryResponseItemModel {
    pub first_send_attempt_result: Option<SendAttemptResult>,
    pub send_attempts: Vec<SendAttemptItemModel>,
    pub signed_payload: JwsNotification,

    #[serde(skip)]
    pub payload: SignedSlot<ResponseBodyV2DecodedPayloadModel>,
}

impl DecodeVerified for NotificationHistoryResponseModel {
    fn decode_signed_fields(&mut self, collector: &mut SignedItemCollector<'_>) {
        for (index, item) in self.notification_history.iter_mut().enumerate() {
            item.payload = collector.decode("signedPayload", &[index], &item.signed_payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::{
        data::verification::test_support::TestPki,
        domain::entities::decode_outcome::SignedFieldRole,
    };

    #[test]
    fn test_request_body_serialization() {
        let start = Utc.with_ymd_and_hms(2023, 9, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2023, 9, 28, 11, 20, 0).unwrap();
        let request = NotificationHistoryRequest::new(start, end)
            .with_notification_type(NotificationType::DidRenew)
            .with_original_transaction_id("1000");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "startDate": 1693526400000i64,
                "endDate": 1695900000000i64,
                "notificationType": "DID_RENEW",
                "originalTransactionId": "1000",
            })
        );
    }

    #[test]
    fn test_nested_tokens_are_verified_and_positioned() {
        let pki = TestPki::generate();
        let foreign = TestPki::generate();
        let notification = |transaction: String| {
            pki.sign(&json!({
                "notificationType": "DID_RENEW",
                "notificationUUID": "uuid",
                "version": "2.0",
                "data": {
                    "bundleId": "com.example.app",
                    "signedTransactionInfo": transaction,
                    "signedRenewalInfo": pki.sign(&json!({ "productId": "com.example.monthly" })),
                },
            }))
        };
        let raw = json!({
            "hasMore": true,
            "paginationToken": "next",
            "notificationHistory": [
                { "signedPayload": notification(pki.sign(&json!({ "transactionId": "good" }))) },
                { "signedPayload": notification(foreign.sign(&json!({ "transactionId": "bad" }))) },
                { "signedPayload": "not-a-token" },
            ],
        })
        .to_string();

        let outcome =
            NotificationHistoryResponseModel::decode_verified(raw.as_bytes(), &pki.verifier())
                .unwrap();
        assert_eq!(outcome.response.pagination_token, "next");
        assert_eq!(outcome.failures.len(), 2);

        assert_eq!(outcome.failures[0].field, "signedTransactionInfo");
        assert_eq!(outcome.failures[0].role, SignedFieldRole::Transaction);
        assert_eq!(outcome.failures[0].position, vec![1]);
        assert_eq!(outcome.failures[1].field, "signedPayload");
        assert_eq!(outcome.failures[1].role, SignedFieldRole::Notification);
        assert_eq!(outcome.failures[1].position, vec![2]);

        let history = &outcome.response.notification_history;
        let first = history[0].payload.value().unwrap().data.as_ref().unwrap();
        assert_eq!(first.transaction_info.value().unwrap().transaction_id, "good");
        let second = history[1].payload.value().unwrap().data.as_ref().unwrap();
        assert!(second.transaction_info.is_failed());
        assert!(second.renewal_info.is_verified());
        assert!(history[2].payload.is_failed());
    }
}
