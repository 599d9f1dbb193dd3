use std::sync::Arc;

use crate::{
    config::AppStoreConfig,
    data::{
        datasources::{
            app_store_server_api_datasource::AppStoreServerApiDatasourceImpl,
            app_store_server_notification_datasource::AppStoreServerNotificationDatasourceImpl,
            bearer_token::BearerTokenMinter,
            transport::{AppStoreTransport, ReqwestTransport},
        },
        models::{
            app_store_server_api::{
                consumption_request_model::ConsumptionRequest,
                history_query::{RefundHistoryQuery, TransactionHistoryQuery},
                history_response_model::HistoryResponseModel,
                notification_history_model::{
                    NotificationHistoryRequest, NotificationHistoryResponseModel,
                },
                order_lookup_response_model::OrderLookupResponseModel,
                refund_history_response_model::RefundHistoryResponseModel,
                renewal_extension_model::{
                    ExtendRenewalDateRequest, ExtendRenewalDateResponseModel,
                    MassExtendRenewalDateRequest, MassExtendRenewalDateResponseModel,
                    MassExtendRenewalDateStatusResponseModel,
                },
                send_test_notification_response::{
                    CheckTestNotificationResponseModel, SendTestNotificationResponseModel,
                },
                status_response_model::StatusResponseModel,
                transaction_info_response_model::TransactionInfoResponseModel,
            },
            app_store_server_notifications::response_body_v2_decoded_payload_model::ResponseBodyV2DecodedPayloadModel,
        },
        repositories::app_store_repository_impl::AppStoreRepositoryImpl,
        verification::{jws_verifier::JwsVerifier, trust_store::TrustStore},
    },
    domain::{
        entities::decode_outcome::DecodeOutcome,
        repositories::app_store_repository::AppStoreRepository,
    },
    errors::AppStoreError,
};

pub struct AppStoreUtil<R: AppStoreRepository> {
    app_store_repository: R,
}

impl<R: AppStoreRepository> AppStoreUtil<R> {
    /// Wraps a custom repository, e.g. a mock in downstream tests.
    pub fn from_repository(app_store_repository: R) -> Self {
        Self {
            app_store_repository,
        }
    }

    pub async fn get_transaction_info(
        &self,
        transaction_id: &str,
    ) -> Result<DecodeOutcome<TransactionInfoResponseModel>, AppStoreError> {
        self.app_store_repository
            .get_transaction_info(transaction_id)
            .await
    }

    pub async fn get_transaction_history(
        &self,
        original_transaction_id: &str,
        query: &TransactionHistoryQuery,
    ) -> Result<DecodeOutcome<HistoryResponseModel>, AppStoreError> {
        self.app_store_repository
            .get_transaction_history(original_transaction_id, query)
            .await
    }

    pub async fn get_refund_history(
        &self,
        original_transaction_id: &str,
        query: &RefundHistoryQuery,
    ) -> Result<DecodeOutcome<RefundHistoryResponseModel>, AppStoreError> {
        self.app_store_repository
            .get_refund_history(original_transaction_id, query)
            .await
    }

    pub async fn get_all_subscription_statuses(
        &self,
        original_transaction_id: &str,
    ) -> Result<DecodeOutcome<StatusResponseModel>, AppStoreError> {
        self.app_store_repository
            .get_all_subscription_statuses(original_transaction_id)
            .await
    }

    pub async fn look_up_order_id(
        &self,
        order_id: &str,
    ) -> Result<DecodeOutcome<OrderLookupResponseModel>, AppStoreError> {
        self.app_store_repository.look_up_order_id(order_id).await
    }

    pub async fn extend_renewal_date(
        &self,
        original_transaction_id: &str,
        request: &ExtendRenewalDateRequest,
    ) -> Result<ExtendRenewalDateResponseModel, AppStoreError> {
        self.app_store_repository
            .extend_renewal_date(original_transaction_id, request)
            .await
    }

    pub async fn mass_extend_renewal_dates(
        &self,
        request: &MassExtendRenewalDateRequest,
    ) -> Result<MassExtendRenewalDateResponseModel, AppStoreError> {
        self.app_store_repository
            .mass_extend_renewal_dates(request)
            .await
    }

    pub async fn get_mass_extend_renewal_date_status(
        &self,
        request_identifier: &str,
        product_id: &str,
    ) -> Result<MassExtendRenewalDateStatusResponseModel, AppStoreError> {
        self.app_store_repository
            .get_mass_extend_renewal_date_status(request_identifier, product_id)
            .await
    }

    pub async fn request_test_notification(
        &self,
    ) -> Result<SendTestNotificationResponseModel, AppStoreError> {
        self.app_store_repository.request_test_notification().await
    }

    pub async fn get_test_notification_status(
        &self,
        test_notification_token: &str,
    ) -> Result<DecodeOutcome<CheckTestNotificationResponseModel>, AppStoreError> {
        self.app_store_repository
            .get_test_notification_status(test_notification_token)
            .await
    }

    pub async fn get_notification_history(
        &self,
        request: &NotificationHistoryRequest,
        pagination_token: Option<&str>,
    ) -> Result<DecodeOutcome<NotificationHistoryResponseModel>, AppStoreError> {
        self.app_store_repository
            .get_notification_history(request, pagination_token)
            .await
    }

    pub async fn send_consumption_info(
        &self,
        original_transaction_id: &str,
        request: &ConsumptionRequest,
    ) -> Result<(), AppStoreError> {
        self.app_store_repository
            .send_consumption_info(original_transaction_id, request)
            .await
    }

    pub fn parse_notification(
        &self,
        body: &str,
    ) -> Result<DecodeOutcome<ResponseBodyV2DecodedPayloadModel>, AppStoreError> {
        self.app_store_repository.parse_notification(body)
    }
}

impl
    AppStoreUtil<
        AppStoreRepositoryImpl<
            AppStoreServerApiDatasourceImpl<ReqwestTransport>,
            AppStoreServerNotificationDatasourceImpl,
        >,
    >
{
    pub fn new(config: &AppStoreConfig) -> Result<Self, AppStoreError> {
        Self::with_transport(config, ReqwestTransport::default())
    }
}

impl<T: AppStoreTransport>
    AppStoreUtil<
        AppStoreRepositoryImpl<
            AppStoreServerApiDatasourceImpl<T>,
            AppStoreServerNotificationDatasourceImpl,
        >,
    >
{
    /// Same as [`AppStoreUtil::new`] but sends requests through `transport`.
    pub fn with_transport(config: &AppStoreConfig, transport: T) -> Result<Self, AppStoreError> {
        let trust_store = TrustStore::load(
            &config.intermediate_certificate,
            &config.root_certificate,
        )?;
        let verifier = JwsVerifier::new(Arc::new(trust_store));
        let token_minter = BearerTokenMinter::new(
            &config.private_key,
            &config.key_id,
            &config.issuer_id,
            &config.bundle_id,
        )?;
        tracing::debug!(
            bundle_id = %config.bundle_id,
            environment = ?config.environment,
            "initialised App Store Server API client"
        );
        Ok(Self {
            app_store_repository: AppStoreRepositoryImpl::new(
                AppStoreServerApiDatasourceImpl::new(
                    transport,
                    token_minter,
                    verifier.clone(),
                    config.environment,
                ),
                AppStoreServerNotificationDatasourceImpl::new(verifier),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        config::ServerEnvironment,
        data::{
            datasources::{bearer_token::tests::api_key_pair, transport::tests::FakeTransport},
            verification::test_support::TestPki,
        },
        errors::JwsError,
    };

    fn config(pki: &TestPki) -> AppStoreConfig {
        let (private_key, _) = api_key_pair();
        AppStoreConfig {
            bundle_id: "com.example.app".to_owned(),
            issuer_id: "issuer".to_owned(),
            key_id: "KEY".to_owned(),
            private_key,
            intermediate_certificate: pki.intermediate.to_pem().unwrap(),
            root_certificate: pki.root.to_der().unwrap(),
            environment: ServerEnvironment::Sandbox,
        }
    }

    #[tokio::test]
    async fn test_status_lookup_keeps_good_items_beside_bad_ones() {
        let pki = TestPki::generate();
        let foreign = TestPki::generate();
        let body = json!({
            "bundleId": "com.example.app",
            "data": [{
                "subscriptionGroupIdentifier": "group",
                "lastTransactions": [
                    {
                        "originalTransactionId": "1000",
                        "status": 1,
                        "signedTransactionInfo": pki.sign(&json!({ "transactionId": "t1" })),
                        "signedRenewalInfo": foreign.sign(&json!({ "autoRenewStatus": 1 })),
                    },
                ],
            }],
        })
        .to_string();
        let util =
            AppStoreUtil::with_transport(&config(&pki), FakeTransport::replying(200, body))
                .unwrap();

        let outcome = util.get_all_subscription_statuses("1000").await.unwrap();
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].field, "signedRenewalInfo");
        assert_eq!(outcome.failures[0].position, vec![0, 0]);

        let item = &outcome.response.data[0].last_transactions[0];
        assert_eq!(item.transaction_info.value().unwrap().transaction_id, "t1");
        assert!(item.renewal_info.is_failed());

        assert!(matches!(
            outcome.into_result(),
            Err(AppStoreError::SignedItems(_))
        ));
    }

    #[test]
    fn test_parse_notification_through_facade() {
        let pki = TestPki::generate();
        let util = AppStoreUtil::with_transport(&config(&pki), FakeTransport::default()).unwrap();
        let token = pki.sign(&json!({ "notificationType": "TEST", "notificationUUID": "u" }));
        let outcome = util
            .parse_notification(&json!({ "signedPayload": token }).to_string())
            .unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.response.notification_uuid, "u");

        let tampered = format!("{}x", token.trim_end_matches(|c| c != '.'));
        assert!(matches!(
            util.parse_notification(&json!({ "signedPayload": tampered }).to_string()),
            Err(AppStoreError::Jws(JwsError::SignatureVerification(_)))
                | Err(AppStoreError::Jws(JwsError::MalformedToken(_)))
        ));
    }

    #[test]
    fn test_rejects_unloadable_certificates() {
        let pki = TestPki::generate();
        let mut config = config(&pki);
        config.root_certificate = b"not a certificate".to_vec();
        assert!(matches!(
            AppStoreUtil::with_transport(&config, FakeTransport::default()),
            Err(AppStoreError::CertificateLoad { .. })
        ));
    }
}
