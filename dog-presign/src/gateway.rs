use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::types::attachment_disposition;
use crate::{AccessGrant, GrantOperation, ObjectKey, SignedUrlStore, TransferResult};

/// Issues time-boxed access grants.
///
/// Trusts the key it is given: existence and integrity are checked by the
/// caller.
#[derive(Clone)]
pub struct AccessUrlGateway {
    signer: Arc<dyn SignedUrlStore>,
    ttl: Duration,
}

impl AccessUrlGateway {
    pub fn new(signer: Arc<dyn SignedUrlStore>, ttl: Duration) -> Self {
        Self { signer, ttl }
    }

    pub async fn issue(&self, key: &ObjectKey, operation: GrantOperation) -> TransferResult<AccessGrant> {
        let url = match operation {
            GrantOperation::Upload => self.signer.sign_put(key.as_str(), self.ttl).await?,
            GrantOperation::Download => {
                let disposition = attachment_disposition(key);
                self.signer
                    .sign_get(key.as_str(), Some(&disposition), self.ttl)
                    .await?
            }
        };

        debug!(key = %key, operation = %operation, ttl_secs = self.ttl.as_secs(), "Issued access grant");
        Ok(AccessGrant::new(operation, key.clone(), url, self.ttl))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
