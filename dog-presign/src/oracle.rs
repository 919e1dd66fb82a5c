use std::sync::Arc;
use tracing::{debug, warn};

use crate::{ForbiddenProbePolicy, HeadOutcome, ObjectStore, TransferError, TransferResult};

/// Answers whether a key is currently present in storage
#[derive(Clone)]
pub struct ExistenceOracle {
    store: Arc<dyn ObjectStore>,
    forbidden: ForbiddenProbePolicy,
}

impl ExistenceOracle {
    pub fn new(store: Arc<dyn ObjectStore>, forbidden: ForbiddenProbePolicy) -> Self {
        Self { store, forbidden }
    }

    /// `false` only for a definite not-found (or a 403 under `TreatAsAbsent`).
    /// Backend faults propagate as `StorageUnavailable`.
    pub async fn exists(&self, key: &str) -> TransferResult<bool> {
        match self.store.head(key).await? {
            HeadOutcome::Present => Ok(true),
            HeadOutcome::NotFound => {
                debug!(key = %key, "Object not found");
                Ok(false)
            }
            HeadOutcome::Forbidden => match self.forbidden {
                ForbiddenProbePolicy::TreatAsAbsent => {
                    debug!(key = %key, "Existence probe forbidden, treating as absent");
                    Ok(false)
                }
                ForbiddenProbePolicy::Propagate => {
                    warn!(key = %key, "Existence probe forbidden");
                    Err(TransferError::storage(format!(
                        "access denied while checking existence of {}",
                        key
                    )))
                }
            },
        }
    }

    pub fn policy(&self) -> ForbiddenProbePolicy {
        self.forbidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedHead(Option<HeadOutcome>);

    #[async_trait]
    impl ObjectStore for FixedHead {
        async fn head(&self, _key: &str) -> TransferResult<HeadOutcome> {
            self.0.ok_or_else(|| TransferError::storage("connection reset"))
        }
    }

    fn oracle(outcome: Option<HeadOutcome>, policy: ForbiddenProbePolicy) -> ExistenceOracle {
        ExistenceOracle::new(Arc::new(FixedHead(outcome)), policy)
    }

    #[tokio::test]
    async fn present_and_absent() {
        let present = oracle(Some(HeadOutcome::Present), ForbiddenProbePolicy::Propagate);
        assert!(present.exists("c/d").await.unwrap());

        let absent = oracle(Some(HeadOutcome::NotFound), ForbiddenProbePolicy::Propagate);
        assert!(!absent.exists("c/d").await.unwrap());
    }

    #[tokio::test]
    async fn forbidden_follows_policy() {
        let lenient = oracle(Some(HeadOutcome::Forbidden), ForbiddenProbePolicy::TreatAsAbsent);
        assert!(!lenient.exists("c/d").await.unwrap());

        let strict = oracle(Some(HeadOutcome::Forbidden), ForbiddenProbePolicy::Propagate);
        let err = strict.exists("c/d").await.unwrap_err();
        assert_eq!(err.code(), "StorageUnavailable");
    }

    #[tokio::test]
    async fn backend_errors_are_not_swallowed() {
        let broken = oracle(None, ForbiddenProbePolicy::TreatAsAbsent);
        assert!(matches!(
            broken.exists("c/d").await,
            Err(TransferError::StorageUnavailable { .. })
        ));
    }
}
