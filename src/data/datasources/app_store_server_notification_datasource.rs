use crate::{
    data::{
        models::app_store_server_notifications::{
            response_body_v2_decoded_payload_model::ResponseBodyV2DecodedPayloadModel,
            response_body_v2_model::ResponseBodyV2Model,
        },
        verification::{
            decode_protocol::{decode_envelope, SignedItemCollector, SignedPayload},
            jws_verifier::JwsVerifier,
        },
    },
    domain::entities::decode_outcome::DecodeOutcome,
    errors::AppStoreError,
};

pub(crate) trait AppStoreServerNotificationDatasource: Send + Sync {
    /// Parse App Store Server Notification:
    /// https://developer.apple.com/documentation/appstoreservernotifications/app-store-server-notifications-v2
    ///
    /// notification:
    ///   The raw POST body of the notification.
    ///
    /// A bad outer signature fails the whole call. The nested transaction and
    /// renewal tokens fail only their own slot.
    fn parse_notification(
        &self,
        notification: &str,
    ) -> Result<DecodeOutcome<ResponseBodyV2DecodedPayloadModel>, AppStoreError>;
}

pub(crate) struct AppStoreServerNotificationDatasourceImpl {
    verifier: JwsVerifier,
}

impl AppStoreServerNotificationDatasource for AppStoreServerNotificationDatasourceImpl {
    fn parse_notification(
        &self,
        notification: &str,
    ) -> Result<DecodeOutcome<ResponseBodyV2DecodedPayloadModel>, AppStoreError> {
        let wrapper: ResponseBodyV2Model = decode_envelope(notification.as_bytes())?;
        let mut payload: ResponseBodyV2DecodedPayloadModel =
            self.verifier.verify_and_decode(&wrapper.signed_payload)?;
        tracing::debug!(
            notification_uuid = %payload.notification_uuid,
            notification_type = ?payload.notification_type,
            "verified App Store Server Notification"
        );

        let mut collector = SignedItemCollector::new(&self.verifier);
        payload.decode_nested(&mut collector, &[]);
        Ok(collector.finish(payload))
    }
}

impl AppStoreServerNotificationDatasourceImpl {
    pub(crate) fn new(verifier: JwsVerifier) -> Self {
        Self { verifier }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        data::{
            models::app_store_server_notifications::response_body_v2_decoded_payload_model::NotificationType,
            verification::test_support::TestPki,
        },
        errors::JwsError,
    };

    fn body(signed_payload: &str) -> String {
        json!({ "signedPayload": signed_payload }).to_string()
    }

    #[test]
    fn test_parses_notification_with_nested_tokens() {
        let pki = TestPki::generate();
        let payload = json!({
            "notificationType": "DID_RENEW",
            "notificationUUID": "uuid-1",
            "version": "2.0",
            "signedDate": 1695900000000i64,
            "data": {
                "bundleId": "com.example.app",
                "signedTransactionInfo": pki.sign(&json!({ "transactionId": "t1" })),
                "signedRenewalInfo": pki.sign(&json!({ "autoRenewProductId": "monthly" })),
            },
        });
        let datasource = AppStoreServerNotificationDatasourceImpl::new(pki.verifier());

        let outcome = datasource
            .parse_notification(&body(&pki.sign(&payload)))
            .unwrap();
        assert!(outcome.is_complete());
        let notification = outcome.response;
        assert_eq!(notification.notification_type, Some(NotificationType::DidRenew));
        let data = notification.data.unwrap();
        assert_eq!(data.transaction_info.value().unwrap().transaction_id, "t1");
        assert_eq!(
            data.renewal_info.value().unwrap().auto_renew_product_id,
            "monthly"
        );
    }

    #[test]
    fn test_missing_renewal_info_is_absent_not_failed() {
        let pki = TestPki::generate();
        let payload = json!({
            "notificationType": "ONE_TIME_CHARGE",
            "data": {
                "signedTransactionInfo": pki.sign(&json!({ "transactionId": "t1" })),
                "signedRenewalInfo": "",
            },
        });
        let datasource = AppStoreServerNotificationDatasourceImpl::new(pki.verifier());

        let outcome = datasource
            .parse_notification(&body(&pki.sign(&payload)))
            .unwrap();
        assert!(outcome.is_complete());
        let data = outcome.response.data.unwrap();
        assert!(data.transaction_info.is_verified());
        assert!(data.renewal_info.is_absent());
    }

    #[test]
    fn test_bad_nested_token_is_collected() {
        let pki = TestPki::generate();
        let foreign = TestPki::generate();
        let payload = json!({
            "notificationType": "REFUND",
            "data": {
                "signedTransactionInfo": foreign.sign(&json!({ "transactionId": "t1" })),
            },
        });
        let datasource = AppStoreServerNotificationDatasourceImpl::new(pki.verifier());

        let outcome = datasource
            .parse_notification(&body(&pki.sign(&payload)))
            .unwrap();
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].field, "signedTransactionInfo");
        assert!(matches!(
            outcome.failures[0].cause,
            JwsError::UntrustedCertificate(_)
        ));
        assert!(outcome.response.data.unwrap().transaction_info.is_failed());
    }

    #[test]
    fn test_untrusted_outer_payload_is_fatal() {
        let pki = TestPki::generate();
        let foreign = TestPki::generate();
        let datasource = AppStoreServerNotificationDatasourceImpl::new(pki.verifier());
        let token = foreign.sign(&json!({ "notificationType": "TEST" }));
        assert!(matches!(
            datasource.parse_notification(&body(&token)),
            Err(AppStoreError::Jws(JwsError::UntrustedCertificate(_)))
        ));
    }

    #[test]
    fn test_body_without_signed_payload_is_envelope_error() {
        let pki = TestPki::generate();
        let datasource = AppStoreServerNotificationDatasourceImpl::new(pki.verifier());
        assert!(matches!(
            datasource.parse_notification(r#"{"somethingElse":1}"#),
            Err(AppStoreError::EnvelopeDecode(_))
        ));
    }
}
