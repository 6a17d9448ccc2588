//! File-backed owner keys
//!
//! Each key lives in `<keys dir>/<address>.json`. The CLI signs as an owner
//! only when that owner's key is present here.

use crate::core::Address;
use crate::crypto::{KeyError, KeyPair};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keystore errors
#[derive(Error, Debug)]
pub enum KeystoreError {
    #[error("No key stored for {0}")]
    KeyNotFound(Address),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

/// On-disk form of an owner key
#[derive(Debug, Serialize, Deserialize)]
struct KeyFile {
    private_key_hex: String,
    address: Address,
    label: Option<String>,
}

/// An owner's signing key
#[derive(Clone)]
pub struct OwnerKey {
    key_pair: KeyPair,
    pub label: Option<String>,
}

impl OwnerKey {
    /// Generate a fresh key
    pub fn generate(label: Option<&str>) -> Self {
        Self {
            key_pair: KeyPair::generate(),
            label: label.map(str::to_string),
        }
    }

    /// Import a key from its hex private key
    pub fn from_private_key(private_key_hex: &str, label: Option<&str>) -> Result<Self, KeystoreError> {
        Ok(Self {
            key_pair: KeyPair::from_private_key_hex(private_key_hex)?,
            label: label.map(str::to_string),
        })
    }

    pub fn address(&self) -> Address {
        self.key_pair.address()
    }

    pub fn public_key(&self) -> String {
        self.key_pair.public_key_hex()
    }

    fn save(&self, path: &Path) -> Result<(), KeystoreError> {
        let file = KeyFile {
            private_key_hex: self.key_pair.private_key_hex(),
            address: self.address(),
            label: self.label.clone(),
        };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    fn load(path: &Path) -> Result<Self, KeystoreError> {
        let file: KeyFile = serde_json::from_str(&fs::read_to_string(path)?)?;
        Self::from_private_key(&file.private_key_hex, file.label.as_deref())
    }

    /// Public information, safe to share
    pub fn info(&self) -> KeyInfo {
        KeyInfo {
            address: self.address(),
            public_key: self.public_key(),
            label: self.label.clone(),
        }
    }
}

/// Public key information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyInfo {
    pub address: Address,
    pub public_key: String,
    pub label: Option<String>,
}

/// Directory of owner keys
#[derive(Debug)]
pub struct Keystore {
    keys_dir: PathBuf,
}

impl Keystore {
    /// Open (and create if needed) a keystore directory
    pub fn new(keys_dir: &Path) -> Result<Self, KeystoreError> {
        fs::create_dir_all(keys_dir)?;
        Ok(Self {
            keys_dir: keys_dir.to_path_buf(),
        })
    }

    fn key_path(&self, address: &Address) -> PathBuf {
        self.keys_dir.join(format!("{}.json", address))
    }

    /// Generate and store a new key
    pub fn create_key(&self, label: Option<&str>) -> Result<OwnerKey, KeystoreError> {
        let key = OwnerKey::generate(label);
        key.save(&self.key_path(&key.address()))?;
        Ok(key)
    }

    /// Store an existing private key
    pub fn import_key(&self, private_key_hex: &str, label: Option<&str>) -> Result<OwnerKey, KeystoreError> {
        let key = OwnerKey::from_private_key(private_key_hex, label)?;
        key.save(&self.key_path(&key.address()))?;
        Ok(key)
    }

    /// Load the key controlling `address`
    pub fn load_key(&self, address: &Address) -> Result<OwnerKey, KeystoreError> {
        let path = self.key_path(address);
        if !path.exists() {
            return Err(KeystoreError::KeyNotFound(*address));
        }
        OwnerKey::load(&path)
    }

    /// All readable keys, sorted by address
    pub fn list_keys(&self) -> Result<Vec<KeyInfo>, KeystoreError> {
        let mut keys = Vec::new();

        for entry in fs::read_dir(&self.keys_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match OwnerKey::load(&path) {
                    Ok(key) => keys.push(key.info()),
                    Err(e) => log::warn!("Skipping unreadable key file {}: {}", path.display(), e),
                }
            }
        }

        keys.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let keystore = Keystore::new(temp_dir.path()).unwrap();

        let key = keystore.create_key(Some("alice")).unwrap();
        let loaded = keystore.load_key(&key.address()).unwrap();

        assert_eq!(loaded.address(), key.address());
        assert_eq!(loaded.public_key(), key.public_key());
        assert_eq!(loaded.label.as_deref(), Some("alice"));
    }

    #[test]
    fn test_import_key() {
        let temp_dir = tempfile::tempdir().unwrap();
        let keystore = Keystore::new(temp_dir.path()).unwrap();

        let original = KeyPair::generate();
        let key = keystore
            .import_key(&original.private_key_hex(), None)
            .unwrap();
        assert_eq!(key.address(), original.address());
    }

    #[test]
    fn test_missing_key() {
        let temp_dir = tempfile::tempdir().unwrap();
        let keystore = Keystore::new(temp_dir.path()).unwrap();
        let address = KeyPair::generate().address();

        assert!(matches!(
            keystore.load_key(&address),
            Err(KeystoreError::KeyNotFound(a)) if a == address
        ));
    }

    #[test]
    fn test_list_keys_skips_garbage() {
        let temp_dir = tempfile::tempdir().unwrap();
        let keystore = Keystore::new(temp_dir.path()).unwrap();
        keystore.create_key(Some("a")).unwrap();
        keystore.create_key(Some("b")).unwrap();
        fs::write(temp_dir.path().join("broken.json"), "{").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "ignore me").unwrap();

        let keys = keystore.list_keys().unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys[0].address < keys[1].address);
    }
}
