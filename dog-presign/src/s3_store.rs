use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use std::time::Duration;
use tracing::error;

use crate::config::read_env;
use crate::{HeadOutcome, ObjectStore, SignedUrlStore, TransferError, TransferResult};

/// S3 connection settings
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint_url: Option<String>,
}

impl S3Config {
    pub fn new<B: Into<String>, R: Into<String>>(bucket: B, region: R) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            access_key_id: None,
            secret_access_key: None,
            endpoint_url: None,
        }
    }

    pub fn with_credentials<A: Into<String>, S: Into<String>>(mut self, access_key_id: A, secret_access_key: S) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    pub fn with_endpoint_url<S: Into<String>>(mut self, endpoint_url: S) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// `S3_BUCKET` and `S3_REGION` are required; static credentials and a
    /// custom endpoint are optional.
    pub fn from_env() -> TransferResult<Self> {
        fn require(key: &str) -> TransferResult<String> {
            read_env(key).ok_or_else(|| TransferError::invalid_config(format!("{} environment variable required", key)))
        }

        let mut config = Self::new(require("S3_BUCKET")?, require("S3_REGION")?);
        match (read_env("S3_ACCESS_KEY_ID"), read_env("S3_SECRET_ACCESS_KEY")) {
            (Some(id), Some(secret)) => config = config.with_credentials(id, secret),
            (None, None) => {}
            _ => {
                return Err(TransferError::invalid_config(
                    "S3_ACCESS_KEY_ID and S3_SECRET_ACCESS_KEY must be set together",
                ))
            }
        }
        if let Some(endpoint) = read_env("S3_ENDPOINT_URL") {
            config = config.with_endpoint_url(endpoint);
        }
        Ok(config)
    }
}

/// S3-compatible backend using the AWS SDK.
///
/// Uses virtual-hosted addressing, so a presigned URL's path is exactly the
/// object key.
#[derive(Clone)]
pub struct S3CompatibleStore {
    client: Client,
    bucket: String,
}

impl S3CompatibleStore {
    pub async fn new(config: S3Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region));

        if let (Some(id), Some(secret)) = (config.access_key_id, config.secret_access_key) {
            let credentials = Credentials::new(id, secret, None, None, "dog-presign");
            loader = loader.credentials_provider(credentials);
        }
        if let Some(endpoint) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let aws_config = loader.load().await;
        Self {
            client: Client::new(&aws_config),
            bucket: config.bucket,
        }
    }

    pub async fn from_env() -> TransferResult<Self> {
        Ok(Self::new(S3Config::from_env()?).await)
    }

    pub fn from_client(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn presigning(expires_in: Duration) -> TransferResult<PresigningConfig> {
        PresigningConfig::expires_in(expires_in)
            .map_err(|e| TransferError::storage_source("invalid presigning window", e))
    }
}

#[async_trait]
impl ObjectStore for S3CompatibleStore {
    async fn head(&self, key: &str) -> TransferResult<HeadOutcome> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        let err = match result {
            Ok(_) => return Ok(HeadOutcome::Present),
            Err(err) => err,
        };

        if let SdkError::ServiceError(service) = &err {
            if service.err().is_not_found() {
                return Ok(HeadOutcome::NotFound);
            }
        }

        match err.raw_response().map(|r| r.status().as_u16()) {
            Some(404) => Ok(HeadOutcome::NotFound),
            Some(403) => Ok(HeadOutcome::Forbidden),
            status => {
                error!(key = %key, status = ?status, "S3 error while checking object existence");
                Err(TransferError::storage_source(
                    format!("S3 HEAD failed for {}", key),
                    err,
                ))
            }
        }
    }
}

#[async_trait]
impl SignedUrlStore for S3CompatibleStore {
    async fn sign_get(
        &self,
        key: &str,
        content_disposition: Option<&str>,
        expires_in: Duration,
    ) -> TransferResult<String> {
        let mut request = self.client.get_object().bucket(&self.bucket).key(key);
        if let Some(disposition) = content_disposition {
            request = request.response_content_disposition(disposition);
        }

        let presigned = request
            .presigned(Self::presigning(expires_in)?)
            .await
            .map_err(|e| TransferError::storage_source(format!("failed to presign GET for {}", key), e))?;
        Ok(presigned.uri().to_string())
    }

    async fn sign_put(&self, key: &str, expires_in: Duration) -> TransferResult<String> {
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(Self::presigning(expires_in)?)
            .await
            .map_err(|e| TransferError::storage_source(format!("failed to presign PUT for {}", key), e))?;
        Ok(presigned.uri().to_string())
    }
}
