use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::hasher::{digest_bytes, digest_stream};
use crate::keys::{derive_key, parse_access_url};
use crate::validate::validate_blob;
use crate::{
    AccessGrant, AccessUrlGateway, DownloadedObject, ExistenceOracle, FileBlob, GrantOperation,
    ObjectKey, ObjectStore, SignedUrlStore, TransferClient, TransferConfig, TransferCtx,
    TransferError, TransferResult, TransportResponse,
};

/// Upload progress, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Validating,
    KeyDerived,
    Checked,
    UrlIssued,
    Transferred,
}

/// Download progress, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Checked,
    UrlIssued,
    Transferred,
    Verified,
}

impl std::fmt::Display for UploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl std::fmt::Display for DownloadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Sequences validation, hashing, existence checks and grant issuance
/// around a single PUT or GET.
///
/// Holds no mutable state. The create-only guarantee rests on the backend:
/// existence is re-checked immediately before every write.
#[derive(Clone)]
pub struct TransferOrchestrator {
    oracle: ExistenceOracle,
    gateway: AccessUrlGateway,
    transport: Arc<dyn TransferClient>,
    config: TransferConfig,
}

impl TransferOrchestrator {
    /// Fails `InvalidConfig` when the config could not produce round-trippable
    /// keys or usable grants.
    pub fn new<S, T>(store: Arc<S>, transport: Arc<T>, config: TransferConfig) -> TransferResult<Self>
    where
        S: SignedUrlStore + 'static,
        T: TransferClient + 'static,
    {
        config.validate()?;

        let probe: Arc<dyn ObjectStore> = store.clone();
        let signer: Arc<dyn SignedUrlStore> = store;
        Ok(Self {
            oracle: ExistenceOracle::new(probe, config.forbidden_probe),
            gateway: AccessUrlGateway::new(signer, config.grant_ttl),
            transport,
            config,
        })
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Validate the file, derive its key and issue an upload grant.
    ///
    /// Fails `ObjectAlreadyExists` when the content is already stored.
    #[instrument(skip_all, fields(request_id = %ctx.request_id))]
    pub async fn request_upload_grant(&self, ctx: &TransferCtx, file: &FileBlob) -> TransferResult<AccessGrant> {
        debug!(state = %UploadState::Validating, size = file.size(), "Validating upload");
        validate_blob(file, self.config.max_file_bytes)?;

        let digest = digest_stream(self.config.hash_algorithm, file.chunks()).await?;
        let key = derive_key(&self.config.container, &digest);
        debug!(state = %UploadState::KeyDerived, key = %key, "Derived object key");

        self.ensure_absent(&key).await?;
        debug!(state = %UploadState::Checked, key = %key, "Key is free");

        let grant = self.gateway.issue(&key, GrantOperation::Upload).await?;
        debug!(state = %UploadState::UrlIssued, key = %key, "Upload grant issued");
        Ok(grant)
    }

    /// PUT the file through a previously issued upload URL.
    ///
    /// The file must hash to the digest embedded in the URL, and the key
    /// must still be free right before the write.
    #[instrument(skip_all, fields(request_id = %ctx.request_id))]
    pub async fn complete_upload(
        &self,
        ctx: &TransferCtx,
        file: &FileBlob,
        access_url: &str,
    ) -> TransferResult<ObjectKey> {
        let parsed = parse_access_url(access_url)?;
        let actual = digest_stream(self.config.hash_algorithm, file.chunks()).await?;

        if !actual.matches(&parsed.digest) {
            warn!(key = %parsed.object_key, actual = %actual, "Hash mismatch against upload grant");
            return Err(TransferError::HashMismatch {
                expected: parsed.digest,
                actual: actual.to_string(),
            });
        }

        let key = parsed.object_key;
        self.ensure_absent(&key).await?;
        debug!(state = %UploadState::Checked, key = %key, "Key still free before transfer");

        let response = self
            .transport
            .put(access_url, file.content_type.as_deref(), file.bytes.clone())
            .await?;
        interpret(&response)?;

        info!(state = %UploadState::Transferred, key = %key, size = file.size(), "Upload complete");
        Ok(key)
    }

    /// Grant and transfer in one call, on the caller's behalf
    pub async fn upload(&self, ctx: &TransferCtx, file: &FileBlob) -> TransferResult<ObjectKey> {
        let grant = self.request_upload_grant(ctx, file).await?;
        self.complete_upload(ctx, file, &grant.url).await
    }

    /// Issue a download grant for an existing key
    #[instrument(skip_all, fields(request_id = %ctx.request_id, key = %key))]
    pub async fn request_download_grant(&self, ctx: &TransferCtx, key: &str) -> TransferResult<AccessGrant> {
        let key = ObjectKey::from_string(key.to_string());
        self.ensure_present(&key).await?;
        debug!(state = %DownloadState::Checked, key = %key, "Object present");

        let grant = self.gateway.issue(&key, GrantOperation::Download).await?;
        debug!(state = %DownloadState::UrlIssued, key = %key, "Download grant issued");
        Ok(grant)
    }

    /// GET the object behind a previously issued download URL.
    ///
    /// Existence is re-confirmed first, and an empty body is an error.
    #[instrument(skip_all, fields(request_id = %ctx.request_id))]
    pub async fn complete_download(&self, ctx: &TransferCtx, access_url: &str) -> TransferResult<DownloadedObject> {
        let key = parse_access_url(access_url)?.object_key;
        self.ensure_present(&key).await?;
        debug!(state = %DownloadState::Checked, key = %key, "Object still present");

        let response = self.transport.get(access_url).await?;
        interpret(&response)?;
        debug!(state = %DownloadState::Transferred, key = %key, size = response.body.len(), "Downloaded");

        if response.body.is_empty() {
            warn!(key = %key, "Downloaded file is empty");
            return Err(TransferError::EmptyFile);
        }

        if self.config.verify_download_digest {
            let actual = digest_bytes(self.config.hash_algorithm, &response.body);
            let expected = key.digest_segment().unwrap_or_default();
            if !actual.matches(expected) {
                warn!(key = %key, actual = %actual, "Downloaded content does not match its key");
                return Err(TransferError::HashMismatch {
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        debug!(state = %DownloadState::Verified, key = %key, "Download verified");

        Ok(DownloadedObject {
            key,
            bytes: response.body,
            content_type: response.content_type,
        })
    }

    /// Grant and transfer in one call, on the caller's behalf
    pub async fn download(&self, ctx: &TransferCtx, key: &str) -> TransferResult<DownloadedObject> {
        let grant = self.request_download_grant(ctx, key).await?;
        self.complete_download(ctx, &grant.url).await
    }

    async fn ensure_absent(&self, key: &ObjectKey) -> TransferResult<()> {
        if self.oracle.exists(key.as_str()).await? {
            warn!(key = %key, "File already exists");
            return Err(TransferError::already_exists(key.as_str()));
        }
        Ok(())
    }

    async fn ensure_present(&self, key: &ObjectKey) -> TransferResult<()> {
        if key.as_str().is_empty() || !self.oracle.exists(key.as_str()).await? {
            debug!(key = %key, "File not present");
            return Err(TransferError::not_found(key.as_str()));
        }
        Ok(())
    }
}

/// 2xx succeeds, 403 means the grant was rejected, anything else failed
fn interpret(response: &TransportResponse) -> TransferResult<()> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 403 {
        warn!("Presigned URL has expired or is invalid");
        return Err(TransferError::AccessGrantExpired);
    }
    Err(TransferError::transfer_status(response.status))
}
