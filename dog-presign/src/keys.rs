//! Object key derivation and access URL parsing.
//!
//! An issued URL carries `<container>/<digest>` as the first two segments of
//! its path. Nothing maps URLs to keys on the side: the key is recovered from
//! the URL every time, so [`derive_key`] and [`parse_access_url`] must stay
//! inverse to each other.

use url::Url;

use crate::{ContentDigest, ObjectKey, TransferError, TransferResult};

/// `{container, digest, objectKey}` recovered from an access URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAccessUrl {
    pub container: String,
    pub digest: String,
    pub object_key: ObjectKey,
}

/// `<container>/<digest>`
pub fn derive_key(container: &str, digest: &ContentDigest) -> ObjectKey {
    ObjectKey::from_string(format!("{}/{}", container, digest.as_str()))
}

/// Split the URL path into container and digest.
///
/// The leading `/` is dropped and the remainder is split on its first `/`.
/// Anything past that separator belongs to the digest segment. Both
/// segments are percent-decoded after the split, so an encoded `/` never
/// moves the boundary.
pub fn parse_access_url(access_url: &str) -> TransferResult<ParsedAccessUrl> {
    let url = Url::parse(access_url)
        .map_err(|e| TransferError::malformed_url(format!("{}: {}", e, access_url)))?;

    let path = url.path();
    let path = path.strip_prefix('/').unwrap_or(path);

    let (container, digest) = path
        .split_once('/')
        .ok_or_else(|| TransferError::malformed_url(format!("Invalid path format: {}", path)))?;

    if container.is_empty() || digest.is_empty() {
        return Err(TransferError::malformed_url(format!(
            "Invalid path format: {}",
            path
        )));
    }

    let container = decode_segment(container)?;
    let digest = decode_segment(digest)?;
    let object_key = ObjectKey::from_string(format!("{}/{}", container, digest));

    Ok(ParsedAccessUrl {
        container,
        digest,
        object_key,
    })
}

/// Percent-decode one path segment
fn decode_segment(segment: &str) -> TransferResult<String> {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| TransferError::malformed_url(format!("Path is not valid UTF-8: {}", segment)))
}
