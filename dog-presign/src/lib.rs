//! # dog-presign: content-addressed transfers over presigned URLs
//!
//! `dog-presign` brokers uploads and downloads against S3-compatible storage
//! without handing out credentials. Callers get short-lived access grants;
//! the bytes themselves decide where an object lives.
//!
//! ## Key Features
//!
//! - **Content-addressed keys**: `<container>/<sha-256 hex>`, so the same bytes always land on the same key
//! - **Create-only uploads**: an existing key is never overwritten, re-checked right before the write
//! - **Grant/content binding**: a grant issued for one file cannot be used to upload another
//! - **Storage agnostic**: S3 via the AWS SDK, or the in-memory backend for tests
//! - **Server agnostic**: no HTTP coupling, see `dog-presign-axum` for the HTTP surface
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use dog_presign::prelude::*;
//! use dog_presign::MemoryObjectStore;
//!
//! # #[tokio::main]
//! # async fn main() -> TransferResult<()> {
//! // 1. One backend playing both storage and transport
//! let store = Arc::new(MemoryObjectStore::new());
//! let transfers = TransferOrchestrator::new(store.clone(), store, TransferConfig::default())?;
//!
//! // 2. Ask for an upload grant, then PUT through it
//! let ctx = TransferCtx::new();
//! let file = FileBlob::new(&b"Hello, world!"[..])
//!     .with_file_name("hello.txt")
//!     .with_content_type("text/plain");
//!
//! let grant = transfers.request_upload_grant(&ctx, &file).await?;
//! let key = transfers.complete_upload(&ctx, &file, &grant.url).await?;
//!
//! // 3. Download it back
//! let object = transfers.download(&ctx, key.as_str()).await?;
//! assert_eq!(&object.bytes[..], b"Hello, world!");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │   TransferOrchestrator   │  ← validation, hashing, state sequencing
//! ├────────────┬─────────────┤
//! │  Existence │  AccessUrl  │  ← HEAD probes / grant issuance
//! │   Oracle   │   Gateway   │
//! ├────────────┴─────────────┤
//! │ ObjectStore + SignedUrl  │  ← storage backend (S3, memory)
//! ├──────────────────────────┤
//! │     TransferClient       │  ← the PUT/GET against the grant
//! └──────────────────────────┘
//! ```

mod config;
mod error;
mod gateway;
pub mod hasher;
pub mod keys;
mod memory;
mod oracle;
mod orchestrator;
mod s3_store;
pub mod store;
mod transport;
mod types;
pub mod validate;

// Re-export main types for clean API
pub use config::{ForbiddenProbePolicy, TransferConfig};
pub use error::{ErrorClass, TransferError, TransferResult};
pub use gateway::AccessUrlGateway;
pub use hasher::{ContentHasher, HashAlgorithm};
pub use keys::ParsedAccessUrl;
pub use memory::MemoryObjectStore;
pub use oracle::ExistenceOracle;
pub use orchestrator::{DownloadState, TransferOrchestrator, UploadState};
pub use s3_store::{S3CompatibleStore, S3Config};
pub use store::{HeadOutcome, ObjectStore, SignedUrlStore};
pub use transport::{HttpTransferClient, TransferClient, TransportResponse};
pub use types::{
    AccessGrant, ByteStream, ContentDigest, DownloadedObject, FileBlob, GrantOperation, ObjectKey,
    TransferCtx,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AccessGrant, FileBlob, GrantOperation, ObjectKey, TransferConfig, TransferCtx,
        TransferError, TransferOrchestrator, TransferResult,
    };
}
