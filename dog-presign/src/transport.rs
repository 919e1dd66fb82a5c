use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::debug;

use crate::{TransferError, TransferResult};

/// Performs the byte transfer against an issued URL.
///
/// Returns whatever status the backend answered with; interpreting it is
/// the orchestrator's job. Errors are reserved for failures to complete the
/// exchange at all.
#[async_trait]
pub trait TransferClient: Send + Sync {
    async fn put(
        &self,
        url: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> TransferResult<TransportResponse>;

    async fn get(&self, url: &str) -> TransferResult<TransportResponse>;
}

/// Raw outcome of a PUT/GET against an access URL
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
    pub content_type: Option<String>,
}

impl TransportResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            body: Bytes::new(),
            content_type: None,
        }
    }

    pub fn with_body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// reqwest-backed transport for real presigned URLs
#[derive(Clone)]
pub struct HttpTransferClient {
    client: reqwest::Client,
}

impl HttpTransferClient {
    /// Client whose only timeout is the one given here
    pub fn new(timeout: Option<Duration>) -> TransferResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransferError::invalid_config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn into_response(response: reqwest::Response) -> TransferResult<TransportResponse> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| TransferError::transfer_source("failed to read response body", e))?;

        Ok(TransportResponse {
            status,
            body,
            content_type,
        })
    }
}

#[async_trait]
impl TransferClient for HttpTransferClient {
    async fn put(
        &self,
        url: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> TransferResult<TransportResponse> {
        let mut request = self.client.put(url).body(body);
        if let Some(ct) = content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, ct);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransferError::transfer_source("upload request failed", e))?;
        debug!(status = response.status().as_u16(), "Upload response");
        Self::into_response(response).await
    }

    async fn get(&self, url: &str) -> TransferResult<TransportResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransferError::transfer_source("download request failed", e))?;
        debug!(status = response.status().as_u16(), "Download response");
        Self::into_response(response).await
    }
}
