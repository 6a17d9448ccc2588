//! Caller authentication for mutating API calls
//!
//! A signed request carries the owner's public key, a compact ECDSA
//! signature and the request body. The signature covers
//! `SHA-256("<action>:" || JSON(body))`, and the caller is the address
//! derived from the public key. Every body carries a nonce that must
//! strictly increase per owner; the last accepted nonce is persisted with
//! the wallet.

use crate::core::{encode_payload, Address};
use crate::crypto::{
    public_key_from_hex, public_key_to_address, tagged_digest, verify_signature, KeyPair,
};
use crate::multisig::StaleNonce;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Action tags bound into request signatures
pub const ACTION_SUBMIT: &str = "submit";
pub const ACTION_CONFIRM: &str = "confirm";
pub const ACTION_REVOKE: &str = "revoke";

/// Authentication failures
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Malformed signature")]
    MalformedSignature,
    #[error("Signature does not match request")]
    BadSignature,
    #[error(transparent)]
    StaleNonce(#[from] StaleNonce),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Request bodies that carry a replay-protection nonce
pub trait Nonced {
    fn nonce(&self) -> u64;
}

/// Body of a submit request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmitBody {
    pub nonce: u64,
    pub destination: Address,
    pub value: u128,
    /// Hex call payload, `"0x"` for a plain transfer
    pub data: String,
}

impl SubmitBody {
    pub fn new(nonce: u64, destination: Address, value: u128, data: &[u8]) -> Self {
        Self {
            nonce,
            destination,
            value,
            data: encode_payload(data),
        }
    }
}

/// Body of a confirm or revoke request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexBody {
    pub nonce: u64,
    pub index: usize,
}

impl Nonced for SubmitBody {
    fn nonce(&self) -> u64 {
        self.nonce
    }
}

impl Nonced for IndexBody {
    fn nonce(&self) -> u64 {
        self.nonce
    }
}

/// A request body signed by an owner key
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedRequest<T> {
    /// Compressed secp256k1 public key, hex
    pub public_key: String,
    /// Compact ECDSA signature, hex
    pub signature: String,
    pub body: T,
}

impl<T: Serialize> SignedRequest<T> {
    /// Sign `body` for `action` with `key_pair`
    pub fn sign(action: &str, body: T, key_pair: &KeyPair) -> Result<Self, AuthError> {
        let digest = tagged_digest(action, &serde_json::to_vec(&body)?);
        Ok(Self {
            public_key: key_pair.public_key_hex(),
            signature: hex::encode(key_pair.sign(&digest)),
            body,
        })
    }

    /// Check the signature and return the caller's address
    pub fn verify(&self, action: &str) -> Result<Address, AuthError> {
        let public_key =
            public_key_from_hex(&self.public_key).map_err(|_| AuthError::InvalidPublicKey)?;
        let signature =
            hex::decode(&self.signature).map_err(|_| AuthError::MalformedSignature)?;

        let digest = tagged_digest(action, &serde_json::to_vec(&self.body)?);
        let valid = verify_signature(&public_key, &digest, &signature)
            .map_err(|_| AuthError::MalformedSignature)?;

        if !valid {
            return Err(AuthError::BadSignature);
        }
        Ok(public_key_to_address(&public_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ADDRESS_LEN;

    #[test]
    fn test_sign_and_verify() {
        let key = KeyPair::generate();
        let body = IndexBody { nonce: 1, index: 0 };

        let request = SignedRequest::sign(ACTION_CONFIRM, body, &key).unwrap();
        assert_eq!(request.verify(ACTION_CONFIRM).unwrap(), key.address());
    }

    #[test]
    fn test_signature_bound_to_action() {
        let key = KeyPair::generate();
        let request =
            SignedRequest::sign(ACTION_CONFIRM, IndexBody { nonce: 1, index: 0 }, &key).unwrap();

        assert!(matches!(
            request.verify(ACTION_REVOKE),
            Err(AuthError::BadSignature)
        ));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let key = KeyPair::generate();
        let destination = Address::from_bytes([7; ADDRESS_LEN]);
        let mut request = SignedRequest::sign(
            ACTION_SUBMIT,
            SubmitBody::new(1, destination, 10, &[]),
            &key,
        )
        .unwrap();

        request.body.value = 10_000;
        assert!(matches!(
            request.verify(ACTION_SUBMIT),
            Err(AuthError::BadSignature)
        ));
    }

    #[test]
    fn test_garbage_credentials() {
        let key = KeyPair::generate();
        let mut request =
            SignedRequest::sign(ACTION_CONFIRM, IndexBody { nonce: 1, index: 0 }, &key).unwrap();

        request.signature = "zz".to_string();
        assert!(matches!(
            request.verify(ACTION_CONFIRM),
            Err(AuthError::MalformedSignature)
        ));

        request.public_key = "02abcd".to_string();
        assert!(matches!(
            request.verify(ACTION_CONFIRM),
            Err(AuthError::InvalidPublicKey)
        ));
    }
}
