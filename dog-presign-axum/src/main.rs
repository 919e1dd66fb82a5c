use std::sync::Arc;

use anyhow::Result;
use dog_presign::{HttpTransferClient, MemoryObjectStore, S3CompatibleStore, TransferConfig, TransferOrchestrator};
use dog_presign_axum::{Backend, HttpConfig, PresignApp};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let http = HttpConfig::from_env()?;
    let config = TransferConfig::from_env()?;

    let transfers = match http.backend {
        Backend::S3 => {
            let store = Arc::new(S3CompatibleStore::from_env().await?);
            let transport = Arc::new(HttpTransferClient::new(Some(http.transport_timeout))?);
            tracing::info!(bucket = %store.bucket(), container = %config.container, "Using S3 backend");
            TransferOrchestrator::new(store, transport, config)?
        }
        Backend::Memory => {
            let store = Arc::new(MemoryObjectStore::new());
            tracing::warn!("Using in-memory backend, objects are lost on restart");
            TransferOrchestrator::new(store.clone(), store, config)?
        }
    };

    let addr = http.addr();

    println!("[dog-presign] listening on http://{addr}");

    PresignApp::with_body_limit(transfers, http.max_body_bytes)
        .listen(addr)
        .await?;

    Ok(())
}
