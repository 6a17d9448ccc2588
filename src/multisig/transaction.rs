//! Proposed multisig transactions
//!
//! A transaction records one external call together with the owners that
//! have confirmed it. Records are never removed from the ledger.

use crate::core::encoding::payload_hex;
use crate::core::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An external call stored by a transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Target address
    pub destination: Address,
    /// Native amount in base units sent with the call
    pub value: u128,
    /// Opaque call payload; empty for a plain value transfer
    #[serde(with = "payload_hex")]
    pub data: Vec<u8>,
}

impl Call {
    pub fn new(destination: Address, value: u128, data: Vec<u8>) -> Self {
        Self {
            destination,
            value,
            data,
        }
    }

    /// Whether this is a plain value transfer
    pub fn is_transfer(&self) -> bool {
        self.data.is_empty()
    }
}

/// Lifecycle state of a transaction
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Below the confirmation threshold
    AwaitingConfirmations,
    /// Quorum reached but the last dispatch failed
    DispatchFailed,
    /// Dispatched successfully; terminal
    Executed,
}

/// A transaction proposed to the multisig ledger
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    /// Position in the ledger, assigned at submission
    pub index: usize,
    /// The stored call
    pub call: Call,
    /// Set once the call dispatched successfully
    pub executed: bool,
    /// Owners currently confirming
    confirmations: BTreeSet<Address>,
    /// Owner that submitted the transaction
    pub submitted_by: Address,
    pub submitted_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    /// Reason reported by the most recent failed dispatch
    pub last_failure: Option<String>,
}

impl Transaction {
    /// Create an unconfirmed, unexecuted transaction
    pub(crate) fn new(index: usize, call: Call, submitted_by: Address) -> Self {
        Self {
            index,
            call,
            executed: false,
            confirmations: BTreeSet::new(),
            submitted_by,
            submitted_at: Utc::now(),
            executed_at: None,
            last_failure: None,
        }
    }

    pub fn destination(&self) -> &Address {
        &self.call.destination
    }

    pub fn value(&self) -> u128 {
        self.call.value
    }

    pub fn data(&self) -> &[u8] {
        &self.call.data
    }

    /// Number of owners currently confirming
    pub fn confirmation_count(&self) -> usize {
        self.confirmations.len()
    }

    /// Whether `owner` currently confirms this transaction
    pub fn is_confirmed_by(&self, owner: &Address) -> bool {
        self.confirmations.contains(owner)
    }

    /// Confirming owners, in address order
    pub fn confirmed_by(&self) -> impl Iterator<Item = &Address> {
        self.confirmations.iter()
    }

    /// Status relative to the ledger's threshold
    pub fn status(&self, required: usize) -> TransactionStatus {
        if self.executed {
            TransactionStatus::Executed
        } else if self.confirmation_count() >= required && self.last_failure.is_some() {
            TransactionStatus::DispatchFailed
        } else {
            TransactionStatus::AwaitingConfirmations
        }
    }

    /// Record a confirmation; returns false if it was already present
    pub(crate) fn add_confirmation(&mut self, owner: Address) -> bool {
        self.confirmations.insert(owner)
    }

    /// Remove a confirmation; returns false if it was not present
    pub(crate) fn remove_confirmation(&mut self, owner: &Address) -> bool {
        self.confirmations.remove(owner)
    }

    pub(crate) fn mark_executed(&mut self) {
        self.executed = true;
        self.executed_at = Some(Utc::now());
        self.last_failure = None;
    }

    pub(crate) fn record_failure(&mut self, reason: String) {
        self.last_failure = Some(reason);
    }
}
