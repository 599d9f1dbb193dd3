use async_trait::async_trait;

use crate::{
    data::models::{
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
    domain::entities::decode_outcome::DecodeOutcome,
    errors::AppStoreError,
};

/// Every App Store Server API operation, plus inbound notification parsing.
///
/// Calls whose response carries signed items return a [`DecodeOutcome`]: the
/// response is usable even when some of its tokens failed verification, and
/// the failures are listed alongside it. Use [`DecodeOutcome::into_result`]
/// to treat any failure as fatal.
#[async_trait]
pub trait AppStoreRepository: Send + Sync {
    async fn get_transaction_info(
        &self,
        transaction_id: &str,
    ) -> Result<DecodeOutcome<TransactionInfoResponseModel>, AppStoreError>;

    /// One page of history. Pass the returned `revision` in the next query
    /// while `has_more` is set.
    async fn get_transaction_history(
        &self,
        original_transaction_id: &str,
        query: &TransactionHistoryQuery,
    ) -> Result<DecodeOutcome<HistoryResponseModel>, AppStoreError>;

    async fn get_refund_history(
        &self,
        original_transaction_id: &str,
        query: &RefundHistoryQuery,
    ) -> Result<DecodeOutcome<RefundHistoryResponseModel>, AppStoreError>;

    async fn get_all_subscription_statuses(
        &self,
        original_transaction_id: &str,
    ) -> Result<DecodeOutcome<StatusResponseModel>, AppStoreError>;

    async fn look_up_order_id(
        &self,
        order_id: &str,
    ) -> Result<DecodeOutcome<OrderLookupResponseModel>, AppStoreError>;

    async fn extend_renewal_date(
        &self,
        original_transaction_id: &str,
        request: &ExtendRenewalDateRequest,
    ) -> Result<ExtendRenewalDateResponseModel, AppStoreError>;

    async fn mass_extend_renewal_dates(
        &self,
        request: &MassExtendRenewalDateRequest,
    ) -> Result<MassExtendRenewalDateResponseModel, AppStoreError>;

    async fn get_mass_extend_renewal_date_status(
        &self,
        request_identifier: &str,
        product_id: &str,
    ) -> Result<MassExtendRenewalDateStatusResponseModel, AppStoreError>;

    async fn request_test_notification(
        &self,
    ) -> Result<SendTestNotificationResponseModel, AppStoreError>;

    async fn get_test_notification_status(
        &self,
        test_notification_token: &str,
    ) -> Result<DecodeOutcome<CheckTestNotificationResponseModel>, AppStoreError>;

    async fn get_notification_history(
        &self,
        request: &NotificationHistoryRequest,
        pagination_token: Option<&str>,
    ) -> Result<DecodeOutcome<NotificationHistoryResponseModel>, AppStoreError>;

    async fn send_consumption_info(
        &self,
        original_transaction_id: &str,
        request: &ConsumptionRequest,
    ) -> Result<(), AppStoreError>;

    /// Verifies the raw POST body of an App Store Server Notification V2.
    fn parse_notification(
        &self,
        body: &str,
    ) -> Result<DecodeOutcome<ResponseBodyV2DecodedPayloadModel>, AppStoreError>;
}
