//! In-process backend for tests and local runs.
//!
//! Plays both the storage backend and the transport: it issues opaque
//! URLs carrying the key in their path, and serves PUT/GET against them
//! with S3 status semantics (200, 403 for bad or expired grants, 404).

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::keys::parse_access_url;
use crate::{
    GrantOperation, HeadOutcome, ObjectStore, SignedUrlStore, TransferClient, TransferError,
    TransferResult, TransportResponse,
};

const SIGNATURE_PARAM: &str = "X-Amz-Signature";

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Bytes,
    content_type: Option<String>,
}

#[derive(Debug, Clone)]
struct IssuedGrant {
    key: String,
    operation: GrantOperation,
    expires_at: DateTime<Utc>,
}

/// In-memory object store that also answers transfers against its own URLs
pub struct MemoryObjectStore {
    base_url: String,
    objects: Mutex<HashMap<String, StoredObject>>,
    grants: Mutex<HashMap<String, IssuedGrant>>,
    deny_head: AtomicBool,
    fail_next: Mutex<Option<u16>>,
    heads: AtomicUsize,
    puts: AtomicUsize,
    gets: AtomicUsize,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::with_base_url("https://memory.dog-presign.local")
    }

    pub fn with_base_url<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: Mutex::new(HashMap::new()),
            grants: Mutex::new(HashMap::new()),
            deny_head: AtomicBool::new(false),
            fail_next: Mutex::new(None),
            heads: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
        }
    }

    /// Store an object directly, bypassing grants (e.g. a concurrent writer)
    pub fn insert<K: Into<String>, B: Into<Bytes>>(&self, key: K, bytes: B) {
        self.objects.lock().insert(
            key.into(),
            StoredObject {
                bytes: bytes.into(),
                content_type: None,
            },
        );
    }

    pub fn remove(&self, key: &str) -> bool {
        self.objects.lock().remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().contains_key(key)
    }

    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().get(key).map(|o| o.bytes.clone())
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.lock().get(key).and_then(|o| o.content_type.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }

    /// Push every issued grant past its expiry
    pub fn expire_grants(&self) {
        let past = Utc::now() - chrono::Duration::seconds(1);
        for grant in self.grants.lock().values_mut() {
            grant.expires_at = past;
        }
    }

    /// Answer every HEAD with 403
    pub fn deny_head(&self, deny: bool) {
        self.deny_head.store(deny, Ordering::SeqCst);
    }

    /// Answer the next PUT/GET with `status` instead of serving it
    pub fn fail_next_transfer(&self, status: u16) {
        *self.fail_next.lock() = Some(status);
    }

    /// Grants still tracked; expired ones are dropped on the next issue
    pub fn grant_count(&self) -> usize {
        self.grants.lock().len()
    }

    pub fn head_count(&self) -> usize {
        self.heads.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    fn issue(
        &self,
        key: &str,
        operation: GrantOperation,
        content_disposition: Option<&str>,
        expires_in: Duration,
    ) -> TransferResult<String> {
        let token = Uuid::new_v4().simple().to_string();
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TransferError::storage_source(format!("cannot build URL for {}", key), e))?;
        url.path_segments_mut()
            .map_err(|_| TransferError::storage(format!("base URL cannot carry a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(key.split('/'));

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("X-Amz-Expires", &expires_in.as_secs().to_string());
            if let Some(disposition) = content_disposition {
                query.append_pair("response-content-disposition", disposition);
            }
            query.append_pair(SIGNATURE_PARAM, &token);
        }

        let now = Utc::now();
        let expires_at =
            now + chrono::Duration::from_std(expires_in).unwrap_or_else(|_| chrono::Duration::zero());

        let mut grants = self.grants.lock();
        grants.retain(|_, grant| grant.expires_at > now);
        grants.insert(
            token,
            IssuedGrant {
                key: key.to_string(),
                operation,
                expires_at,
            },
        );
        Ok(url.to_string())
    }

    /// Key the URL authorizes, or `None` when the grant is unknown, expired,
    /// for another operation, or the path was altered
    fn authorize(&self, access_url: &str, operation: GrantOperation) -> Option<String> {
        let url = Url::parse(access_url).ok()?;
        let token = url
            .query_pairs()
            .find(|(name, _)| name == SIGNATURE_PARAM)
            .map(|(_, value)| value.into_owned())?;

        let path_key = parse_access_url(access_url).ok()?.object_key;
        let grants = self.grants.lock();
        let grant = grants.get(&token)?;

        let valid = grant.operation == operation && grant.key == path_key.as_str() && grant.expires_at > Utc::now();
        valid.then(|| grant.key.clone())
    }

    fn take_failure(&self) -> Option<u16> {
        self.fail_next.lock().take()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn head(&self, key: &str) -> TransferResult<HeadOutcome> {
        self.heads.fetch_add(1, Ordering::SeqCst);
        if self.deny_head.load(Ordering::SeqCst) {
            return Ok(HeadOutcome::Forbidden);
        }
        if self.contains(key) {
            Ok(HeadOutcome::Present)
        } else {
            Ok(HeadOutcome::NotFound)
        }
    }
}

#[async_trait]
impl SignedUrlStore for MemoryObjectStore {
    async fn sign_get(
        &self,
        key: &str,
        content_disposition: Option<&str>,
        expires_in: Duration,
    ) -> TransferResult<String> {
        self.issue(key, GrantOperation::Download, content_disposition, expires_in)
    }

    async fn sign_put(&self, key: &str, expires_in: Duration) -> TransferResult<String> {
        self.issue(key, GrantOperation::Upload, None, expires_in)
    }
}

#[async_trait]
impl TransferClient for MemoryObjectStore {
    async fn put(
        &self,
        url: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> TransferResult<TransportResponse> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.take_failure() {
            return Ok(TransportResponse::new(status));
        }

        let Some(key) = self.authorize(url, GrantOperation::Upload) else {
            return Ok(TransportResponse::new(403));
        };

        // Plain PUT semantics: a duplicate write replaces the object
        self.objects.lock().insert(
            key,
            StoredObject {
                bytes: body,
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(TransportResponse::new(200))
    }

    async fn get(&self, url: &str) -> TransferResult<TransportResponse> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.take_failure() {
            return Ok(TransportResponse::new(status));
        }

        let Some(key) = self.authorize(url, GrantOperation::Download) else {
            return Ok(TransportResponse::new(403));
        };

        let object = self.objects.lock().get(&key).cloned();
        Ok(match object {
            Some(object) => {
                let mut response = TransportResponse::new(200).with_body(object.bytes);
                if let Some(ct) = object.content_type {
                    response = response.with_content_type(ct);
                }
                response
            }
            None => TransportResponse::new(404),
        })
    }
}
