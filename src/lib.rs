//! Multisig Ledger: an M-of-N multi-signature transaction ledger in Rust
//!
//! This crate provides:
//! - A fixed owner set with a confirmation threshold
//! - Submit / confirm / revoke with automatic execution at quorum
//! - Pluggable call dispatch, with a native-balance treasury built in
//! - An audit log of every ledger event
//! - ECDSA (secp256k1) owner keys and signed API requests
//! - JSON persistence with rotating backups
//! - A REST API and a CLI
//!
//! # Example
//!
//! ```rust
//! use multisig_ledger::core::{Address, ONE_COIN};
//! use multisig_ledger::multisig::{MultisigWallet, OwnerSet};
//!
//! let alice = Address::from_bytes([1; 20]);
//! let bob = Address::from_bytes([2; 20]);
//! let carol = Address::from_bytes([3; 20]);
//! let recipient = Address::from_bytes([9; 20]);
//!
//! // 2-of-3 wallet holding one coin
//! let owners = OwnerSet::new(vec![alice, bob, carol], 2).unwrap();
//! let mut wallet = MultisigWallet::new(owners);
//! wallet.deposit(alice, ONE_COIN);
//!
//! // Alice proposes, Bob's confirmation executes the transfer
//! let index = wallet.submit(&alice, recipient, ONE_COIN / 2, vec![]).unwrap();
//! let outcome = wallet.confirm(&bob, index).unwrap();
//! assert!(outcome.executed);
//! assert_eq!(wallet.balance(), ONE_COIN / 2);
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod crypto;
pub mod multisig;
pub mod storage;
pub mod wallet;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use crate::core::{Address, ONE_COIN};
pub use crypto::KeyPair;
pub use multisig::{
    Call, Dispatcher, Ledger, LedgerError, MultisigWallet, OwnerSet, Transaction, Treasury,
};
pub use storage::Storage;
pub use wallet::Keystore;
