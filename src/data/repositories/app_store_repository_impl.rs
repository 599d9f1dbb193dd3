use async_trait::async_trait;

use crate::{
    data::{
        datasources::{
            app_store_server_api_datasource::AppStoreServerApiDatasource,
            app_store_server_notification_datasource::AppStoreServerNotificationDatasource,
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
    },
    domain::{
        entities::decode_outcome::DecodeOutcome,
        repositories::app_store_repository::AppStoreRepository,
    },
    errors::AppStoreError,
};

pub(crate) struct AppStoreRepositoryImpl<
    A: AppStoreServerApiDatasource,
    B: AppStoreServerNotificationDatasource,
> {
    app_store_server_api_datasource: A,
    app_store_server_notification_datasource: B,
}

#[async_trait]
impl<A: AppStoreServerApiDatasource, B: AppStoreServerNotificationDatasource> AppStoreRepository
    for AppStoreRepositoryImpl<A, B>
{
    async fn get_transaction_info(
        &self,
        transaction_id: &str,
    ) -> Result<DecodeOutcome<TransactionInfoResponseModel>, AppStoreError> {
        self.app_store_server_api_datasource
            .get_transaction_info(transaction_id)
            .await
    }

    async fn get_transaction_history(
        &self,
        original_transaction_id: &str,
        query: &TransactionHistoryQuery,
    ) -> Result<DecodeOutcome<HistoryResponseModel>, AppStoreError> {
        self.app_store_server_api_datasource
            .get_transaction_history(original_transaction_id, query)
            .await
    }

    async fn get_refund_history(
        &self,
        original_transaction_id: &str,
        query: &RefundHistoryQuery,
    ) -> Result<DecodeOutcome<RefundHistoryResponseModel>, AppStoreError> {
        self.app_store_server_api_datasource
            .get_refund_history(original_transaction_id, query)
            .await
    }

    async fn get_all_subscription_statuses(
        &self,
        original_transaction_id: &str,
    ) -> Result<DecodeOutcome<StatusResponseModel>, AppStoreError> {
        self.app_store_server_api_datasource
            .get_all_subscription_statuses(original_transaction_id)
            .await
    }

    async fn look_up_order_id(
        &self,
        order_id: &str,
    ) -> Result<DecodeOutcome<OrderLookupResponseModel>, AppStoreError> {
        self.app_store_server_api_datasource
            .look_up_order_id(order_id)
            .await
    }

    async fn extend_renewal_date(
        &self,
        original_transaction_id: &str,
        request: &ExtendRenewalDateRequest,
    ) -> Result<ExtendRenewalDateResponseModel, AppStoreError> {
        self.app_store_server_api_datasource
            .extend_renewal_date(original_transaction_id, request)
            .await
    }

    async fn mass_extend_renewal_dates(
        &self,
        request: &MassExtendRenewalDateRequest,
    ) -> Result<MassExtendRenewalDateResponseModel, AppStoreError> {
        self.app_store_server_api_datasource
            .mass_extend_renewal_dates(request)
            .await
    }

    async fn get_mass_extend_renewal_date_status(
        &self,
        request_identifier: &str,
        product_id: &str,
    ) -> Result<MassExtendRenewalDateStatusResponseModel, AppStoreError> {
        self.app_store_server_api_datasource
            .get_mass_extend_renewal_date_status(request_identifier, product_id)
            .await
    }

    async fn request_test_notification(
        &self,
    ) -> Result<SendTestNotificationResponseModel, AppStoreError> {
        self.app_store_server_api_datasource
            .request_test_notification()
            .await
    }

    async fn get_test_notification_status(
        &self,
        test_notification_token: &str,
    ) -> Result<DecodeOutcome<CheckTestNotificationResponseModel>, AppStoreError> {
        self.app_store_server_api_datasource
            .get_test_notification_status(test_notification_token)
            .await
    }

    async fn get_notification_history(
        &self,
        request: &NotificationHistoryRequest,
        pagination_token: Option<&str>,
    ) -> Result<DecodeOutcome<NotificationHistoryResponseModel>, AppStoreError> {
        self.app_store_server_api_datasource
            .get_notification_history(request, pagination_token)
            .await
    }

    async fn send_consumption_info(
        &self,
        original_transaction_id: &str,
        request: &ConsumptionRequest,
    ) -> Result<(), AppStoreError> {
        self.app_store_server_api_datasource
            .send_consumption_info(original_transaction_id, request)
            .await
    }

    fn parse_notification(
        &self,
        body: &str,
    ) -> Result<DecodeOutcome<ResponseBodyV2DecodedPayloadModel>, AppStoreError> {
        self.app_store_server_notification_datasource
            .parse_notification(body)
    }
}

impl<A: AppStoreServerApiDatasource, B: AppStoreServerNotificationDatasource>
    AppStoreRepositoryImpl<A, B>
{
    pub(crate) fn new(
        app_store_server_api_datasource: A,
        app_store_server_notification_datasource: B,
    ) -> Self {
        Self {
            app_store_server_api_datasource,
            app_store_server_notification_datasource,
        }
    }
}
