//! Errors raised by the multisig ledger

use crate::core::Address;
use thiserror::Error;

/// Errors related to ledger configuration and operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Not owner: {0}")]
    NotOwner(Address),
    #[error("Transaction {index} already confirmed by {owner}")]
    AlreadyConfirmed { index: usize, owner: Address },
    #[error("Transaction {index} not confirmed by {owner}")]
    NotConfirmed { index: usize, owner: Address },
    #[error("Transaction {0} already executed")]
    AlreadyExecuted(usize),
    #[error("Transaction {index} failed: {reason}")]
    ExecutionFailed { index: usize, reason: String },
    #[error("Transaction {0} does not exist")]
    InvalidIndex(usize),
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error("Owner set must not be empty")]
    NoOwners,
    #[error("Duplicate owner: {0}")]
    DuplicateOwner(Address),
    #[error("Corrupt ledger: {0}")]
    CorruptLedger(String),
}

impl LedgerError {
    /// Whether the error left ledger state untouched
    ///
    /// Every rejection is non-mutating except a failed dispatch, which keeps
    /// the confirmation that reached quorum.
    pub fn is_non_mutating(&self) -> bool {
        !matches!(self, LedgerError::ExecutionFailed { .. })
    }
}
