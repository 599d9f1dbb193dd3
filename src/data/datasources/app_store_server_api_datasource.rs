use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, Url};
use serde::Serialize;

use crate::{
    config::ServerEnvironment,
    data::{
        models::app_store_server_api::{
            consumption_request_model::ConsumptionRequest,
            error_response_model::ErrorResponseModel,
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
        verification::{
            decode_protocol::{decode_envelope, DecodeVerified},
            jws_verifier::JwsVerifier,
        },
    },
    domain::entities::decode_outcome::DecodeOutcome,
    errors::AppStoreError,
};

use super::{
    bearer_token::BearerTokenMinter,
    transport::{ApiRequest, AppStoreTransport},
};

#[async_trait]
pub(crate) trait AppStoreServerApiDatasource: Send + Sync {
    /// Get Transaction Info:
    /// https://developer.apple.com/documentation/appstoreserverapi/get_transaction_info
    async fn get_transaction_info(
        &self,
        transaction_id: &str,
    ) -> Result<DecodeOutcome<TransactionInfoResponseModel>, AppStoreError>;

    /// Get Transaction History:
    /// https://developer.apple.com/documentation/appstoreserverapi/get_transaction_history
    async fn get_transaction_history(
        &self,
        original_transaction_id: &str,
        query: &TransactionHistoryQuery,
    ) -> Result<DecodeOutcome<HistoryResponseModel>, AppStoreError>;

    /// Get Refund History:
    /// https://developer.apple.com/documentation/appstoreserverapi/get_refund_history
    async fn get_refund_history(
        &self,
        original_transaction_id: &str,
        query: &RefundHistoryQuery,
    ) -> Result<DecodeOutcome<RefundHistoryResponseModel>, AppStoreError>;

    /// Get All Subscription Statuses:
    /// https://developer.apple.com/documentation/appstoreserverapi/get_all_subscription_statuses
    async fn get_all_subscription_statuses(
        &self,
        original_transaction_id: &str,
    ) -> Result<DecodeOutcome<StatusResponseModel>, AppStoreError>;

    /// Look Up Order ID:
    /// https://developer.apple.com/documentation/appstoreserverapi/look_up_order_id
    async fn look_up_order_id(
        &self,
        order_id: &str,
    ) -> Result<DecodeOutcome<OrderLookupResponseModel>, AppStoreError>;

    /// Extend a Subscription Renewal Date:
    /// https://developer.apple.com/documentation/appstoreserverapi/extend_a_subscription_renewal_date
    async fn extend_renewal_date(
        &self,
        original_transaction_id: &str,
        request: &ExtendRenewalDateRequest,
    ) -> Result<ExtendRenewalDateResponseModel, AppStoreError>;

    /// Extend Subscription Renewal Dates for All Active Subscribers:
    /// https://developer.apple.com/documentation/appstoreserverapi/extend_subscription_renewal_dates_for_all_active_subscribers
    async fn mass_extend_renewal_dates(
        &self,
        request: &MassExtendRenewalDateRequest,
    ) -> Result<MassExtendRenewalDateResponseModel, AppStoreError>;

    /// Get Status of Subscription Renewal Date Extensions:
    /// https://developer.apple.com/documentation/appstoreserverapi/get_status_of_subscription_renewal_date_extensions
    async fn get_mass_extend_renewal_date_status(
        &self,
        request_identifier: &str,
        product_id: &str,
    ) -> Result<MassExtendRenewalDateStatusResponseModel, AppStoreError>;

    /// Request a Test Notification:
    /// https://developer.apple.com/documentation/appstoreserverapi/request_a_test_notification
    async fn request_test_notification(
        &self,
    ) -> Result<SendTestNotificationResponseModel, AppStoreError>;

    /// Get Test Notification Status:
    /// https://developer.apple.com/documentation/appstoreserverapi/get_test_notification_status
    async fn get_test_notification_status(
        &self,
        test_notification_token: &str,
    ) -> Result<DecodeOutcome<CheckTestNotificationResponseModel>, AppStoreError>;

    /// Get Notification History:
    /// https://developer.apple.com/documentation/appstoreserverapi/get_notification_history
    async fn get_notification_history(
        &self,
        request: &NotificationHistoryRequest,
        pagination_token: Option<&str>,
    ) -> Result<DecodeOutcome<NotificationHistoryResponseModel>, AppStoreError>;

    /// Send Consumption Information:
    /// https://developer.apple.com/documentation/appstoreserverapi/send_consumption_information
    async fn send_consumption_info(
        &self,
        original_transaction_id: &str,
        request: &ConsumptionRequest,
    ) -> Result<(), AppStoreError>;
}

pub(crate) struct AppStoreServerApiDatasourceImpl<T: AppStoreTransport> {
    transport: T,
    token_minter: BearerTokenMinter,
    verifier: JwsVerifier,
    host: &'static str,
}

#[async_trait]
impl<T: AppStoreTransport> AppStoreServerApiDatasource for AppStoreServerApiDatasourceImpl<T> {
    async fn get_transaction_info(
        &self,
        transaction_id: &str,
    ) -> Result<DecodeOutcome<TransactionInfoResponseModel>, AppStoreError> {
        let url = self.endpoint(&["inApps", "v1", "transactions", transaction_id])?;
        self.callout_and_decode(Method::GET, url, None, "GetTransactionInfo")
            .await
    }

    async fn get_transaction_history(
        &self,
        original_transaction_id: &str,
        query: &TransactionHistoryQuery,
    ) -> Result<DecodeOutcome<HistoryResponseModel>, AppStoreError> {
        let mut url = self.endpoint(&["inApps", "v1", "history", original_transaction_id])?;
        query.apply(&mut url);
        self.callout_and_decode(Method::GET, url, None, "GetTransactionHistory")
            .await
    }

    async fn get_refund_history(
        &self,
        original_transaction_id: &str,
        query: &RefundHistoryQuery,
    ) -> Result<DecodeOutcome<RefundHistoryResponseModel>, AppStoreError> {
        let mut url = self.endpoint(&["inApps", "v2", "refund", "lookup", original_transaction_id])?;
        query.apply(&mut url);
        self.callout_and_decode(Method::GET, url, None, "GetRefundHistory")
            .await
    }

    async fn get_all_subscription_statuses(
        &self,
        original_transaction_id: &str,
    ) -> Result<DecodeOutcome<StatusResponseModel>, AppStoreError> {
        let url = self.endpoint(&["inApps", "v1", "subscriptions", original_transaction_id])?;
        self.callout_and_decode(Method::GET, url, None, "GetAllSubscriptionStatuses")
            .await
    }

    async fn look_up_order_id(
        &self,
        order_id: &str,
    ) -> Result<DecodeOutcome<OrderLookupResponseModel>, AppStoreError> {
        let url = self.endpoint(&["inApps", "v1", "lookup", order_id])?;
        self.callout_and_decode(Method::GET, url, None, "LookUpOrderId")
            .await
    }

    async fn extend_renewal_date(
        &self,
        original_transaction_id: &str,
        request: &ExtendRenewalDateRequest,
    ) -> Result<ExtendRenewalDateResponseModel, AppStoreError> {
        let url = self.endpoint(&[
            "inApps",
            "v1",
            "subscriptions",
            "extend",
            original_transaction_id,
        ])?;
        let body = json_body(request)?;
        let raw = self
            .callout(Method::PUT, url, Some(body), "ExtendRenewalDate")
            .await?;
        decode_envelope(&raw)
    }

    async fn mass_extend_renewal_dates(
        &self,
        request: &MassExtendRenewalDateRequest,
    ) -> Result<MassExtendRenewalDateResponseModel, AppStoreError> {
        let url = self.endpoint(&["inApps", "v1", "subscriptions", "extend", "mass"])?;
        let body = json_body(request)?;
        let raw = self
            .callout(Method::POST, url, Some(body), "MassExtendRenewalDates")
            .await?;
        decode_envelope(&raw)
    }

    async fn get_mass_extend_renewal_date_status(
        &self,
        request_identifier: &str,
        product_id: &str,
    ) -> Result<MassExtendRenewalDateStatusResponseModel, AppStoreError> {
        let url = self.endpoint(&[
            "inApps",
            "v1",
            "subscriptions",
            "extend",
            "mass",
            request_identifier,
            product_id,
        ])?;
        let raw = self
            .callout(Method::GET, url, None, "GetMassExtendRenewalDateStatus")
            .await?;
        decode_envelope(&raw)
    }

    async fn request_test_notification(
        &self,
    ) -> Result<SendTestNotificationResponseModel, AppStoreError> {
        let url = self.endpoint(&["inApps", "v1", "notifications", "test"])?;
        let raw = self
            .callout(Method::POST, url, None, "RequestTestNotification")
            .await?;
        decode_envelope(&raw)
    }

    async fn get_test_notification_status(
        &self,
        test_notification_token: &str,
    ) -> Result<DecodeOutcome<CheckTestNotificationResponseModel>, AppStoreError> {
        let url = self.endpoint(&["inApps", "v1", "notifications", "test", test_notification_token])?;
        self.callout_and_decode(Method::GET, url, None, "GetTestNotificationStatus")
            .await
    }

    async fn get_notification_history(
        &self,
        request: &NotificationHistoryRequest,
        pagination_token: Option<&str>,
    ) -> Result<DecodeOutcome<NotificationHistoryResponseModel>, AppStoreError> {
        let mut url = self.endpoint(&["inApps", "v1", "notifications", "history"])?;
        if let Some(pagination_token) = pagination_token {
            url.query_pairs_mut()
                .append_pair("paginationToken", pagination_token);
        }
        let body = json_body(request)?;
        self.callout_and_decode(Method::POST, url, Some(body), "GetNotificationHistory")
            .await
    }

    async fn send_consumption_info(
        &self,
        original_transaction_id: &str,
        request: &ConsumptionRequest,
    ) -> Result<(), AppStoreError> {
        let url = self.endpoint(&[
            "inApps",
            "v1",
            "transactions",
            "consumption",
            original_transaction_id,
        ])?;
        let body = json_body(request)?;
        self.callout(Method::PUT, url, Some(body), "SendConsumptionInfo")
            .await?;
        Ok(())
    }
}

impl<T: AppStoreTransport> AppStoreServerApiDatasourceImpl<T> {
    pub(crate) fn new(
        transport: T,
        token_minter: BearerTokenMinter,
        verifier: JwsVerifier,
        environment: ServerEnvironment,
    ) -> Self {
        Self {
            transport,
            token_minter,
            verifier,
            host: environment.host(),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppStoreError> {
        let mut url = Url::parse(self.host)
            .map_err(|e| AppStoreError::Config(format!("invalid host {}; {e}", self.host)))?;
        url.path_segments_mut()
            .map_err(|_| AppStoreError::Config(format!("host {} cannot take a path", self.host)))?
            .extend(segments);
        Ok(url)
    }

    async fn callout_and_decode<R: DecodeVerified>(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        function_name: &str,
    ) -> Result<DecodeOutcome<R>, AppStoreError> {
        let raw = self.callout(method, url, body, function_name).await?;
        let outcome = R::decode_verified(&raw, &self.verifier)?;
        if !outcome.is_complete() {
            tracing::warn!(
                function_name,
                failed = outcome.failures.len(),
                "some signed items in the response failed verification"
            );
        }
        Ok(outcome)
    }

    async fn callout(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        function_name: &str,
    ) -> Result<Vec<u8>, AppStoreError> {
        let bearer_token = self.token_minter.mint(Utc::now())?;
        tracing::debug!(function_name, %method, url = %url, "calling App Store Server API");
        let response = self
            .transport
            .send(ApiRequest {
                method,
                url,
                bearer_token,
                body,
            })
            .await?;
        tracing::debug!(function_name, status = response.status, "App Store Server API responded");

        match response.status {
            200..=299 => Ok(response.body),
            401 => Err(AppStoreError::Unauthorized),
            status => Err(error_from_body(status, &response.body)),
        }
    }
}

fn json_body<B: Serialize>(body: &B) -> Result<Vec<u8>, AppStoreError> {
    serde_json::to_vec(body).map_err(|e| AppStoreError::RequestEncode(e.to_string()))
}

fn error_from_body(status: u16, body: &[u8]) -> AppStoreError {
    match serde_json::from_slice::<ErrorResponseModel>(body) {
        Ok(error) => AppStoreError::Platform {
            code: error.error_code,
            message: error.error_message,
        },
        Err(_) => AppStoreError::UnexpectedStatus {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        },
    }
}
