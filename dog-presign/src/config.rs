use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::{HashAlgorithm, TransferError, TransferResult};

/// What a permission-denied answer to an existence probe means.
///
/// Some S3-compatible backends answer HEAD with 403 instead of 404 when the
/// caller may not list the bucket, so neither reading is always right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForbiddenProbePolicy {
    /// 403 on HEAD means the object is absent
    TreatAsAbsent,
    /// 403 on HEAD fails the operation with `StorageUnavailable`
    #[default]
    Propagate,
}

impl FromStr for ForbiddenProbePolicy {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "absent" | "treat-as-absent" => Ok(Self::TreatAsAbsent),
            "propagate" => Ok(Self::Propagate),
            other => Err(TransferError::invalid_config(format!(
                "unknown forbidden probe policy: {}",
                other
            ))),
        }
    }
}

/// Configuration for transfer operations
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Namespace prefix of every object key. Must not contain `/`.
    pub container: String,

    /// Largest accepted upload
    pub max_file_bytes: u64,

    /// Validity window of issued access grants
    pub grant_ttl: Duration,

    /// Digest used for object keys
    pub hash_algorithm: HashAlgorithm,

    pub forbidden_probe: ForbiddenProbePolicy,

    /// Recompute the digest of downloaded bytes against the key
    pub verify_download_digest: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            container: "myBucket".to_string(),
            max_file_bytes: 1024 * 1024, // 1MB
            grant_ttl: Duration::from_secs(5 * 60),
            hash_algorithm: HashAlgorithm::Sha256,
            forbidden_probe: ForbiddenProbePolicy::Propagate,
            verify_download_digest: false,
        }
    }
}

impl TransferConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container<S: Into<String>>(mut self, container: S) -> Self {
        self.container = container.into();
        self
    }

    pub fn with_max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = bytes;
        self
    }

    pub fn with_grant_ttl(mut self, ttl: Duration) -> Self {
        self.grant_ttl = ttl;
        self
    }

    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    pub fn with_forbidden_probe(mut self, policy: ForbiddenProbePolicy) -> Self {
        self.forbidden_probe = policy;
        self
    }

    pub fn verify_download_digest(mut self) -> Self {
        self.verify_download_digest = true;
        self
    }

    /// Defaults overridden by `PRESIGN_*` environment variables
    pub fn from_env() -> TransferResult<Self> {
        let mut config = Self::default();

        if let Some(container) = read_env("PRESIGN_CONTAINER") {
            config.container = container;
        }
        if let Some(bytes) = read_env("PRESIGN_MAX_FILE_BYTES") {
            config.max_file_bytes = parse_number("PRESIGN_MAX_FILE_BYTES", &bytes)?;
        }
        if let Some(secs) = read_env("PRESIGN_GRANT_TTL_SECS") {
            config.grant_ttl = Duration::from_secs(parse_number("PRESIGN_GRANT_TTL_SECS", &secs)?);
        }
        if let Some(algorithm) = read_env("PRESIGN_HASH_ALGORITHM") {
            config.hash_algorithm = algorithm.parse()?;
        }
        if let Some(policy) = read_env("PRESIGN_FORBIDDEN_PROBE") {
            config.forbidden_probe = policy.parse()?;
        }
        if let Some(flag) = read_env("PRESIGN_VERIFY_DOWNLOAD_DIGEST") {
            config.verify_download_digest = flag.parse().map_err(|_| {
                TransferError::invalid_config(format!(
                    "PRESIGN_VERIFY_DOWNLOAD_DIGEST must be true or false, got {}",
                    flag
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would break key derivation or grant issuance
    pub fn validate(&self) -> TransferResult<()> {
        if self.container.is_empty() {
            return Err(TransferError::invalid_config("container must not be empty"));
        }
        if self.container == "." || self.container == ".." {
            return Err(TransferError::invalid_config(format!(
                "container cannot be a dot segment: {}",
                self.container
            )));
        }
        if self.container.contains('/') {
            return Err(TransferError::invalid_config(format!(
                "container must be a single path segment: {}",
                self.container
            )));
        }
        if self.max_file_bytes == 0 {
            return Err(TransferError::invalid_config("max_file_bytes must be positive"));
        }
        if self.grant_ttl.is_zero() {
            return Err(TransferError::invalid_config("grant_ttl must be positive"));
        }
        Ok(())
    }
}

pub(crate) fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_number(key: &str, value: &str) -> TransferResult<u64> {
    value.trim().parse::<u64>().map_err(|_| {
        TransferError::invalid_config(format!("{} must be a non-negative integer, got {}", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TransferConfig::default();
        assert_eq!(config.container, "myBucket");
        assert_eq!(config.max_file_bytes, 1024 * 1024);
        assert_eq!(config.grant_ttl, Duration::from_secs(300));
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(config.forbidden_probe, ForbiddenProbePolicy::Propagate);
        assert!(!config.verify_download_digest);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = TransferConfig::new()
            .with_container("media")
            .with_max_file_bytes(10)
            .with_grant_ttl(Duration::from_secs(60))
            .with_hash_algorithm(HashAlgorithm::Blake3)
            .with_forbidden_probe(ForbiddenProbePolicy::TreatAsAbsent)
            .verify_download_digest();
        assert_eq!(config.container, "media");
        assert_eq!(config.max_file_bytes, 10);
        assert_eq!(config.grant_ttl.as_secs(), 60);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Blake3);
        assert_eq!(config.forbidden_probe, ForbiddenProbePolicy::TreatAsAbsent);
        assert!(config.verify_download_digest);
    }

    #[test]
    fn container_with_separator_is_rejected() {
        let err = TransferConfig::new().with_container("a/b").validate().unwrap_err();
        assert_eq!(err.code(), "InvalidConfig");
        assert!(TransferConfig::new().with_container("").validate().is_err());
        assert!(TransferConfig::new().with_container("..").validate().is_err());
        assert!(TransferConfig::new().with_container("my uploads").validate().is_ok());
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(TransferConfig::new().with_max_file_bytes(0).validate().is_err());
        assert!(TransferConfig::new().with_grant_ttl(Duration::ZERO).validate().is_err());
    }

    #[test]
    fn probe_policy_parses() {
        assert_eq!("absent".parse::<ForbiddenProbePolicy>().unwrap(), ForbiddenProbePolicy::TreatAsAbsent);
        assert_eq!("Propagate".parse::<ForbiddenProbePolicy>().unwrap(), ForbiddenProbePolicy::Propagate);
        assert!("sometimes".parse::<ForbiddenProbePolicy>().is_err());
    }
}
