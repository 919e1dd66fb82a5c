//! Content hashing.
//!
//! Stateless helpers: the algorithm is a plain value and every digest is a
//! pure function of the bytes fed in, regardless of how they are chunked.

use futures_util::StreamExt;
use std::str::FromStr;

use crate::{ByteStream, ContentDigest, FileBlob, TransferError};

/// 256-bit digest algorithms usable for object keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha-256",
            HashAlgorithm::Blake3 => "blake3",
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha-256" | "sha256" => Ok(HashAlgorithm::Sha256),
            "blake3" => Ok(HashAlgorithm::Blake3),
            other => Err(TransferError::HashingUnavailable {
                algorithm: other.to_string(),
            }),
        }
    }
}

/// Incremental hashing state
pub struct ContentHasher {
    inner: HasherState,
}

enum HasherState {
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl ContentHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let inner = match algorithm {
            HashAlgorithm::Sha256 => HasherState::Sha256(<sha2::Sha256 as sha2::Digest>::new()),
            HashAlgorithm::Blake3 => HasherState::Blake3(Box::new(blake3::Hasher::new())),
        };
        Self { inner }
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.inner {
            HasherState::Sha256(h) => sha2::Digest::update(h, data),
            HasherState::Blake3(h) => {
                h.update(data);
            }
        }
    }

    pub fn finalize(self) -> ContentDigest {
        match self.inner {
            HasherState::Sha256(h) => ContentDigest::from_bytes(&sha2::Digest::finalize(h)),
            HasherState::Blake3(h) => ContentDigest::from_bytes(h.finalize().as_bytes()),
        }
    }
}

/// Digest of an in-memory byte slice
pub fn digest_bytes(algorithm: HashAlgorithm, data: &[u8]) -> ContentDigest {
    let mut hasher = ContentHasher::new(algorithm);
    hasher.update(data);
    hasher.finalize()
}

/// Digest of a file blob
pub fn digest(algorithm: HashAlgorithm, blob: &FileBlob) -> ContentDigest {
    digest_bytes(algorithm, &blob.bytes)
}

/// Digest of a stream, holding one chunk at a time.
///
/// Errors only when the stream itself fails to yield data.
pub async fn digest_stream(
    algorithm: HashAlgorithm,
    mut stream: ByteStream,
) -> Result<ContentDigest, std::io::Error> {
    let mut hasher = ContentHasher::new(algorithm);
    while let Some(chunk) = stream.next().await {
        hasher.update(&chunk?);
    }
    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(digest_bytes(HashAlgorithm::Sha256, b"abc").as_str(), ABC_SHA256);
    }

    #[test]
    fn blake3_produces_256_bit_hex() {
        let d = digest_bytes(HashAlgorithm::Blake3, b"abc");
        assert_eq!(d.as_str().len(), 64);
        assert_ne!(d.as_str(), ABC_SHA256);
    }

    #[test]
    fn algorithm_names_parse() {
        assert_eq!("SHA-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("sha256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("blake3".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Blake3);
    }

    #[test]
    fn unknown_algorithm_is_unavailable() {
        let err = "md5".parse::<HashAlgorithm>().unwrap_err();
        assert!(matches!(err, TransferError::HashingUnavailable { ref algorithm } if algorithm == "md5"));
    }

    #[tokio::test]
    async fn streamed_digest_equals_in_memory_digest() {
        let blob = FileBlob::new(vec![42u8; 20_000]);
        let streamed = digest_stream(HashAlgorithm::Sha256, blob.chunks()).await.unwrap();
        assert_eq!(streamed, digest(HashAlgorithm::Sha256, &blob));
    }

    #[tokio::test]
    async fn stream_read_errors_propagate() {
        let stream: ByteStream = Box::pin(futures_util::stream::iter(vec![
            Ok(bytes::Bytes::from_static(b"ab")),
            Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "cut")),
        ]));
        assert!(digest_stream(HashAlgorithm::Sha256, stream).await.is_err());
    }

    proptest! {
        #[test]
        fn digest_is_independent_of_chunking(data in proptest::collection::vec(any::<u8>(), 0..4096), split in 0usize..4096) {
            let split = split.min(data.len());
            let mut hasher = ContentHasher::new(HashAlgorithm::Sha256);
            hasher.update(&data[..split]);
            hasher.update(&data[split..]);
            prop_assert_eq!(hasher.finalize(), digest_bytes(HashAlgorithm::Sha256, &data));
        }
    }
}
