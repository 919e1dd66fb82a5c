use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use uuid::Uuid;

/// Stream of bytes for blob content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Chunk size used when a blob is replayed as a stream
pub const STREAM_CHUNK_BYTES: usize = 8 * 1024;

/// Context for a single transfer request
#[derive(Debug, Clone)]
pub struct TransferCtx {
    pub request_id: String,
}

impl TransferCtx {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_request_id<S: Into<String>>(mut self, request_id: S) -> Self {
        self.request_id = request_id.into();
        self
    }
}

impl Default for TransferCtx {
    fn default() -> Self {
        Self::new()
    }
}

/// File handed over by the inbound transport for one request.
///
/// Never persisted; dropped when the request completes.
#[derive(Debug, Clone)]
pub struct FileBlob {
    pub bytes: Bytes,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl FileBlob {
    pub fn new<B: Into<Bytes>>(bytes: B) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: None,
            content_type: None,
        }
    }

    pub fn with_file_name<S: Into<String>>(mut self, file_name: S) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Replay the content as a stream of zero-copy slices
    pub fn chunks(&self) -> ByteStream {
        let bytes = self.bytes.clone();
        let chunks: Vec<Result<Bytes, std::io::Error>> = (0..bytes.len())
            .step_by(STREAM_CHUNK_BYTES)
            .map(|start| {
                let end = (start + STREAM_CHUNK_BYTES).min(bytes.len());
                Ok(bytes.slice(start..end))
            })
            .collect();
        Box::pin(futures_util::stream::iter(chunks))
    }
}

/// Lowercase hex digest of a file's full content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(String);

impl ContentDigest {
    pub(crate) fn from_bytes(raw: &[u8]) -> Self {
        Self(hex::encode(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex digests compare case-insensitively
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage address of an object: `<container>/<digest>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn from_string(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment, used as the download filename
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Segment after the container prefix
    pub fn digest_segment(&self) -> Option<&str> {
        self.0.split_once('/').map(|(_, digest)| digest)
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an access grant authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantOperation {
    Upload,
    Download,
}

impl std::fmt::Display for GrantOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrantOperation::Upload => write!(f, "upload"),
            GrantOperation::Download => write!(f, "download"),
        }
    }
}

/// Time-boxed URL authorizing one operation on one key.
///
/// Not stored anywhere. Expiry is enforced by the backend; callers see it
/// as `AccessGrantExpired` when the transfer is attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub operation: GrantOperation,
    pub url: String,
    pub key: ObjectKey,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub expires_in_secs: u64,
}

impl AccessGrant {
    pub fn new(operation: GrantOperation, key: ObjectKey, url: String, ttl: Duration) -> Self {
        let issued_at = Utc::now();
        let expires_at = issued_at
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());
        Self {
            operation,
            url,
            key,
            issued_at,
            expires_at,
            expires_in_secs: ttl.as_secs(),
        }
    }

    pub fn validity(&self) -> Duration {
        Duration::from_secs(self.expires_in_secs)
    }
}

/// Bytes fetched through a download grant
#[derive(Debug, Clone)]
pub struct DownloadedObject {
    pub key: ObjectKey,
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

impl DownloadedObject {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// `Content-Disposition` value naming the file after the key
    pub fn content_disposition(&self) -> String {
        attachment_disposition(&self.key)
    }
}

pub(crate) fn attachment_disposition(key: &ObjectKey) -> String {
    format!("attachment; filename=\"{}\"", key.file_name())
}
