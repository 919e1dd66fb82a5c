use async_trait::async_trait;
use std::time::Duration;

use crate::TransferResult;

/// Existence probe against the storage backend - must be implemented by all backends
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// HEAD-style lookup of a key.
    ///
    /// Only transport/backend faults are errors. Not-found and
    /// permission-denied answers are reported as outcomes so the caller can
    /// apply its own policy to the latter.
    async fn head(&self, key: &str) -> TransferResult<HeadOutcome>;
}

/// Presigned URL issuance
#[async_trait]
pub trait SignedUrlStore: ObjectStore {
    /// Generate a signed URL for reading.
    ///
    /// `content_disposition` is embedded so the backend serves the object
    /// under that disposition.
    async fn sign_get(
        &self,
        key: &str,
        content_disposition: Option<&str>,
        expires_in: Duration,
    ) -> TransferResult<String>;

    /// Generate a signed URL for writing
    async fn sign_put(&self, key: &str, expires_in: Duration) -> TransferResult<String>;
}

/// Answer to a HEAD probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadOutcome {
    Present,
    NotFound,
    /// Backend refused the probe (HTTP 403)
    Forbidden,
}
