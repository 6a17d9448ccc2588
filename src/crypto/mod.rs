//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256 hashing and domain-separated digests
//! - ECDSA key management (secp256k1) and owner address derivation

pub mod hash;
pub mod keys;

pub use hash::{sha256, sha256_hex, tagged_digest};
pub use keys::{
    public_key_from_hex, public_key_to_address, sign_digest, verify_signature, KeyError, KeyPair,
};
