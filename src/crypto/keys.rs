//! Owner key management
//!
//! Owners hold secp256k1 key pairs. An owner's ledger address is the last
//! 20 bytes of SHA-256 over the 64-byte uncompressed public key body.

use rand::rngs::OsRng;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::sha256;
use crate::core::Address;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A secp256k1 key pair belonging to one owner
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Private key as hex
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Public key as hex (compressed, 33 bytes)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Ledger address controlled by this key
    pub fn address(&self) -> Address {
        public_key_to_address(&self.public_key)
    }

    /// Sign a 32-byte digest
    pub fn sign(&self, digest: &[u8; 32]) -> Vec<u8> {
        sign_digest(&self.secret_key, digest)
    }
}

/// Derive the ledger address of a public key
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let digest = sha256(&uncompressed[1..]);
    let mut bytes = [0u8; crate::core::ADDRESS_LEN];
    bytes.copy_from_slice(&digest[digest.len() - crate::core::ADDRESS_LEN..]);
    Address::from_bytes(bytes)
}

/// Parse a public key from hex (compressed or uncompressed)
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Produce a compact (64-byte) ECDSA signature over a digest
pub fn sign_digest(secret_key: &SecretKey, digest: &[u8; 32]) -> Vec<u8> {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest(*digest);
    secp.sign_ecdsa(&message, secret_key)
        .serialize_compact()
        .to_vec()
}

/// Verify a compact ECDSA signature over a digest
///
/// Malformed signatures are an error; well-formed signatures that do not
/// match return `Ok(false)`.
pub fn verify_signature(
    public_key: &PublicKey,
    digest: &[u8; 32],
    signature: &[u8],
) -> Result<bool, KeyError> {
    let secp = Secp256k1::verification_only();
    let message = Message::from_digest(*digest);
    let sig = Signature::from_compact(signature).map_err(|_| KeyError::InvalidSignature)?;

    Ok(secp.verify_ecdsa(&message, &sig, public_key).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert_eq!(kp.private_key_hex().len(), 64);
        assert_eq!(kp.public_key_hex().len(), 66);
        assert!(!kp.address().is_zero());
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = KeyPair::generate();
        let digest = sha256(b"confirm transaction 0");

        let signature = kp.sign(&digest);
        assert!(verify_signature(&kp.public_key, &digest, &signature).unwrap());

        let other = sha256(b"confirm transaction 1");
        assert!(!verify_signature(&kp.public_key, &other, &signature).unwrap());
    }

    #[test]
    fn test_malformed_signature() {
        let kp = KeyPair::generate();
        let digest = sha256(b"payload");
        assert!(matches!(
            verify_signature(&kp.public_key, &digest, &[0u8; 10]),
            Err(KeyError::InvalidSignature)
        ));
    }

    #[test]
    fn test_address_is_stable_across_import() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::from_private_key_hex(&kp1.private_key_hex()).unwrap();
        assert_eq!(kp1.address(), kp2.address());

        let pk = public_key_from_hex(&kp1.public_key_hex()).unwrap();
        assert_eq!(public_key_to_address(&pk), kp1.address());
    }
}
