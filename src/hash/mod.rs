//! Content hashing for upload deduplication
//!
//! Every selected image is keyed by the SHA-256 digest of its raw bytes. The
//! same digest is recorded on the stored solve so that re-submitting an image
//! that was already solved resolves from the local cache.

use crate::types::ContentHash;
use sha2::{Digest, Sha256};

/// Compute the content hash of an image
///
/// Deterministic and side-effect free. The digest is rendered as 64 lowercase
/// hex characters.
pub fn content_hash(bytes: &[u8]) -> ContentHash {
    debug_assert!(!bytes.is_empty(), "hashing an empty image");

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    ContentHash::new(hex::encode(hasher.finalize()))
}
