//! Multisig wallet: a ledger paired with the treasury that executes its calls

use crate::core::Address;
use crate::multisig::dispatch::Treasury;
use crate::multisig::error::LedgerError;
use crate::multisig::ledger::{ConfirmOutcome, Ledger};
use crate::multisig::nonces::NonceRegistry;
use crate::multisig::owners::OwnerSet;
use serde::{Deserialize, Serialize};

/// A ledger and its treasury, persisted and served together
#[derive(Debug, Serialize, Deserialize)]
pub struct MultisigWallet {
    pub ledger: Ledger,
    pub treasury: Treasury,
    /// Replay counters for owners' signed requests
    #[serde(default)]
    pub nonces: NonceRegistry,
}

impl MultisigWallet {
    /// Create a wallet with an empty ledger and no funds
    pub fn new(owners: OwnerSet) -> Self {
        Self {
            ledger: Ledger::new(owners),
            treasury: Treasury::new(),
            nonces: NonceRegistry::new(),
        }
    }

    /// Address holding the wallet's funds
    pub fn address(&self) -> Address {
        *self.ledger.address()
    }

    /// Funds currently held by the wallet
    pub fn balance(&self) -> u128 {
        self.treasury.balance_of(self.ledger.address())
    }

    /// Accept native funds into the wallet
    pub fn deposit(&mut self, from: Address, amount: u128) -> u128 {
        let address = self.address();
        let balance = self.treasury.deposit(&address, amount);
        self.ledger.record_deposit(from, amount);
        balance
    }

    pub fn submit(
        &mut self,
        caller: &Address,
        destination: Address,
        value: u128,
        data: Vec<u8>,
    ) -> Result<usize, LedgerError> {
        self.ledger
            .submit(caller, destination, value, data, &mut self.treasury)
    }

    pub fn confirm(&mut self, caller: &Address, index: usize) -> Result<ConfirmOutcome, LedgerError> {
        self.ledger.confirm(caller, index, &mut self.treasury)
    }

    pub fn revoke(&mut self, caller: &Address, index: usize) -> Result<usize, LedgerError> {
        self.ledger.revoke(caller, index)
    }
}
