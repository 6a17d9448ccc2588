//! Ledger audit log

use crate::core::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Something that happened to the ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Deposit {
        from: Address,
        amount: u128,
    },
    Submission {
        index: usize,
        owner: Address,
        destination: Address,
        value: u128,
    },
    Confirmation {
        index: usize,
        owner: Address,
    },
    Revocation {
        index: usize,
        owner: Address,
    },
    Execution {
        index: usize,
    },
    ExecutionFailure {
        index: usize,
        reason: String,
    },
}

impl LedgerEvent {
    /// Index of the transaction the event concerns, if any
    pub fn transaction_index(&self) -> Option<usize> {
        match self {
            LedgerEvent::Deposit { .. } => None,
            LedgerEvent::Submission { index, .. }
            | LedgerEvent::Confirmation { index, .. }
            | LedgerEvent::Revocation { index, .. }
            | LedgerEvent::Execution { index }
            | LedgerEvent::ExecutionFailure { index, .. } => Some(*index),
        }
    }
}

/// A timestamped, sequenced event
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub at: DateTime<Utc>,
    pub event: LedgerEvent,
}
