//! Multisig transaction ledger
//!
//! Owns the owner set and every proposed transaction. The only mutating
//! operations are [`Ledger::submit`], [`Ledger::confirm`] and
//! [`Ledger::revoke`]; everything else is a read.
//!
//! Rejected calls never change state. The one exception is a dispatch
//! failure after quorum: the confirmation that reached quorum is kept and
//! the transaction stays unexecuted, so a confirmation from another owner
//! retries the dispatch.

use crate::core::{format_native, Address};
use crate::multisig::dispatch::Dispatcher;
use crate::multisig::error::LedgerError;
use crate::multisig::events::{EventRecord, LedgerEvent};
use crate::multisig::owners::OwnerSet;
use crate::multisig::transaction::{Call, Transaction};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Result of a successful confirmation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ConfirmOutcome {
    pub index: usize,
    pub executed: bool,
    pub confirmations: usize,
}

/// Summary of the ledger, as printed by the admin tooling
#[derive(Clone, Debug, Serialize)]
pub struct LedgerStatus {
    pub address: Address,
    pub owners: Vec<Address>,
    pub required: usize,
    pub transaction_count: usize,
    pub pending: usize,
    pub executed: usize,
}

/// The multisig transaction ledger
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "LedgerRecord")]
pub struct Ledger {
    owners: OwnerSet,
    address: Address,
    transactions: Vec<Transaction>,
    #[serde(default)]
    events: Vec<EventRecord>,
}

/// Unvalidated wire form of a ledger
#[derive(Deserialize)]
struct LedgerRecord {
    owners: OwnerSet,
    address: Address,
    transactions: Vec<Transaction>,
    #[serde(default)]
    events: Vec<EventRecord>,
}

impl TryFrom<LedgerRecord> for Ledger {
    type Error = LedgerError;

    /// Reject snapshots that the ledger operations could never have produced
    fn try_from(record: LedgerRecord) -> Result<Self, Self::Error> {
        let expected = record.owners.wallet_address();
        if record.address != expected {
            return Err(LedgerError::CorruptLedger(format!(
                "address {} does not match owner set (expected {})",
                record.address, expected
            )));
        }

        for (position, tx) in record.transactions.iter().enumerate() {
            if tx.index != position {
                return Err(LedgerError::CorruptLedger(format!(
                    "transaction at position {} has index {}",
                    position, tx.index
                )));
            }
            if !record.owners.contains(&tx.submitted_by) {
                return Err(LedgerError::CorruptLedger(format!(
                    "transaction {} submitted by non-owner {}",
                    tx.index, tx.submitted_by
                )));
            }
            if let Some(stranger) = tx.confirmed_by().find(|a| !record.owners.contains(a)) {
                return Err(LedgerError::CorruptLedger(format!(
                    "transaction {} confirmed by non-owner {}",
                    tx.index, stranger
                )));
            }
        }

        Ok(Self {
            owners: record.owners,
            address: record.address,
            transactions: record.transactions,
            events: record.events,
        })
    }
}

impl Ledger {
    /// Create an empty ledger governed by `owners`
    pub fn new(owners: OwnerSet) -> Self {
        let address = owners.wallet_address();
        log::info!(
            "Created {} multisig ledger at {}",
            owners.description(),
            address
        );

        Self {
            owners,
            address,
            transactions: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Propose a call; the submitter's confirmation is recorded in the same step
    ///
    /// With a threshold of one the call is dispatched immediately. If that
    /// dispatch fails the transaction is still recorded, confirmed by the
    /// submitter, and the error carries its index.
    pub fn submit(
        &mut self,
        caller: &Address,
        destination: Address,
        value: u128,
        data: Vec<u8>,
        dispatcher: &mut dyn Dispatcher,
    ) -> Result<usize, LedgerError> {
        self.ensure_owner(caller)?;

        let index = self.transactions.len();
        let mut transaction = Transaction::new(index, Call::new(destination, value, data), *caller);
        transaction.add_confirmation(*caller);
        self.transactions.push(transaction);

        self.record(LedgerEvent::Submission {
            index,
            owner: *caller,
            destination,
            value,
        });
        self.record(LedgerEvent::Confirmation {
            index,
            owner: *caller,
        });

        log::info!(
            "Transaction {} submitted by {}: {} to {} (1/{} confirmations)",
            index,
            caller,
            format_native(value),
            destination,
            self.owners.required()
        );

        self.execute_if_ready(index, dispatcher)?;
        Ok(index)
    }

    /// Confirm a transaction, executing it once quorum is reached
    pub fn confirm(
        &mut self,
        caller: &Address,
        index: usize,
        dispatcher: &mut dyn Dispatcher,
    ) -> Result<ConfirmOutcome, LedgerError> {
        self.ensure_owner(caller)?;
        let transaction = self.mutable_transaction(index)?;

        if !transaction.add_confirmation(*caller) {
            log::debug!("{} already confirmed transaction {}", caller, index);
            return Err(LedgerError::AlreadyConfirmed {
                index,
                owner: *caller,
            });
        }
        let confirmations = transaction.confirmation_count();

        self.record(LedgerEvent::Confirmation {
            index,
            owner: *caller,
        });
        log::info!(
            "Transaction {} confirmed by {} ({}/{})",
            index,
            caller,
            confirmations,
            self.owners.required()
        );

        let executed = self.execute_if_ready(index, dispatcher)?;

        Ok(ConfirmOutcome {
            index,
            executed,
            confirmations,
        })
    }

    /// Withdraw the caller's confirmation from an unexecuted transaction
    pub fn revoke(&mut self, caller: &Address, index: usize) -> Result<usize, LedgerError> {
        self.ensure_owner(caller)?;
        let transaction = self.mutable_transaction(index)?;

        if !transaction.remove_confirmation(caller) {
            return Err(LedgerError::NotConfirmed {
                index,
                owner: *caller,
            });
        }
        let confirmations = transaction.confirmation_count();

        self.record(LedgerEvent::Revocation {
            index,
            owner: *caller,
        });
        log::info!(
            "Transaction {} confirmation revoked by {} ({}/{})",
            index,
            caller,
            confirmations,
            self.owners.required()
        );

        Ok(confirmations)
    }

    /// Dispatch the stored call if quorum is met and it has not executed yet
    fn execute_if_ready(
        &mut self,
        index: usize,
        dispatcher: &mut dyn Dispatcher,
    ) -> Result<bool, LedgerError> {
        let required = self.owners.required();
        let source = self.address;
        let transaction = &mut self.transactions[index];

        if transaction.executed || transaction.confirmation_count() < required {
            return Ok(false);
        }

        match dispatcher.dispatch(&source, &transaction.call) {
            Ok(()) => {
                transaction.mark_executed();
                self.record(LedgerEvent::Execution { index });
                log::info!("Transaction {} executed", index);
                Ok(true)
            }
            Err(e) => {
                let reason = e.to_string();
                transaction.record_failure(reason.clone());
                self.record(LedgerEvent::ExecutionFailure {
                    index,
                    reason: reason.clone(),
                });
                log::warn!("Transaction {} failed to execute: {}", index, reason);
                Err(LedgerError::ExecutionFailed { index, reason })
            }
        }
    }

    /// Record an incoming native deposit in the audit log
    pub fn record_deposit(&mut self, from: Address, amount: u128) {
        self.record(LedgerEvent::Deposit { from, amount });
        log::info!("Received {} from {}", format_native(amount), from);
    }

    fn record(&mut self, event: LedgerEvent) {
        let sequence = self.events.len() as u64;
        self.events.push(EventRecord {
            sequence,
            at: Utc::now(),
            event,
        });
    }

    fn ensure_owner(&self, caller: &Address) -> Result<(), LedgerError> {
        if self.owners.contains(caller) {
            Ok(())
        } else {
            log::debug!("Rejected call from non-owner {}", caller);
            Err(LedgerError::NotOwner(*caller))
        }
    }

    /// An existing transaction that can still change
    fn mutable_transaction(&mut self, index: usize) -> Result<&mut Transaction, LedgerError> {
        let transaction = self
            .transactions
            .get_mut(index)
            .ok_or(LedgerError::InvalidIndex(index))?;

        if transaction.executed {
            return Err(LedgerError::AlreadyExecuted(index));
        }
        Ok(transaction)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Address of the wallet this ledger controls
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn owner_set(&self) -> &OwnerSet {
        &self.owners
    }

    pub fn owners(&self) -> &[Address] {
        self.owners.owners()
    }

    pub fn is_owner(&self, address: &Address) -> bool {
        self.owners.contains(address)
    }

    pub fn required_confirmations(&self) -> usize {
        self.owners.required()
    }

    /// Number of transactions ever submitted, executed ones included
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn transaction(&self, index: usize) -> Result<&Transaction, LedgerError> {
        self.transactions
            .get(index)
            .ok_or(LedgerError::InvalidIndex(index))
    }

    /// Owners confirming a transaction, in owner-set order
    pub fn confirmations(&self, index: usize) -> Result<Vec<Address>, LedgerError> {
        let transaction = self.transaction(index)?;
        Ok(self
            .owners
            .owners()
            .iter()
            .filter(|owner| transaction.is_confirmed_by(owner))
            .copied()
            .collect())
    }

    /// Whether `owner` currently confirms a transaction
    pub fn is_confirmed(&self, index: usize, owner: &Address) -> Result<bool, LedgerError> {
        Ok(self.transaction(index)?.is_confirmed_by(owner))
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Unexecuted transactions in index order
    pub fn pending_transactions(&self) -> Vec<&Transaction> {
        self.transactions.iter().filter(|tx| !tx.executed).collect()
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Events concerning transaction `index`, oldest first
    pub fn transaction_history(&self, index: usize) -> impl Iterator<Item = &EventRecord> {
        self.events
            .iter()
            .filter(move |record| record.event.transaction_index() == Some(index))
    }

    pub fn status(&self) -> LedgerStatus {
        let executed = self.transactions.iter().filter(|tx| tx.executed).count();
        LedgerStatus {
            address: self.address,
            owners: self.owners.owners().to_vec(),
            required: self.owners.required(),
            transaction_count: self.transactions.len(),
            pending: self.transactions.len() - executed,
            executed,
        }
    }
}
