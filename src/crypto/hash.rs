//! Hashing helpers
//!
//! SHA-256 is used both for address derivation and for the digests that
//! owners sign when calling the ledger remotely.

use sha2::{Digest, Sha256};

/// Computes the SHA-256 digest of `data`
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes the SHA-256 digest of `data` as lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Digest of a domain-separated message: `SHA-256(tag || ":" || payload)`
///
/// Signed API actions use the action name as the tag so that a signature
/// for one action can never be replayed as another.
pub fn tagged_digest(tag: &str, payload: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(tag.as_bytes());
    hasher.update(b":");
    hasher.update(payload);
    hasher.finalize().into()
}
