//! Storage module for ledger persistence

pub mod lock;
pub mod persistence;

pub use lock::DataDirLock;
pub use persistence::{Storage, StorageConfig, StorageError, StorageStats};
