//! Owner key storage

pub mod keystore;

pub use keystore::{KeyInfo, Keystore, KeystoreError, OwnerKey};
