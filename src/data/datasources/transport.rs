use async_trait::async_trait;
use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Method, Url,
};

use crate::errors::AppStoreError;

/// An outbound call to the App Store Server API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub bearer_token: String,
    /// JSON body, if any.
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Sends a request and hands back the raw status and body. Status dispatch
/// and decoding happen above this layer.
#[async_trait]
pub trait AppStoreTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AppStoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AppStoreTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AppStoreError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .header(AUTHORIZATION, format!("Bearer {}", request.bearer_token));
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| AppStoreError::Transport(format!("callout failed to send; {e:?}")))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| AppStoreError::Transport(format!("failed to read response body; {e:?}")))?;
        Ok(ApiResponse {
            status,
            body: body.to_vec(),
        })
    }
}
