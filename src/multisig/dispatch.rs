//! Call dispatch
//!
//! The ledger hands a transaction's call to a [`Dispatcher`] once quorum is
//! reached and only looks at whether it succeeded. [`Treasury`] is the
//! local dispatcher: it keeps native balances and forwards calls to
//! registered [`CallTarget`]s.

use crate::core::{format_native, Address};
use crate::multisig::transaction::Call;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

/// Reasons a dispatched call can fail
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("Call reverted: {0}")]
    Reverted(String),
}

/// Executes stored calls on behalf of a multisig wallet
pub trait Dispatcher {
    /// Perform `call` from `source`; the ledger only needs success or failure
    fn dispatch(&mut self, source: &Address, call: &Call) -> Result<(), DispatchError>;
}

/// Code reachable at a destination address
pub trait CallTarget: Send + Sync {
    /// Handle a call; an `Err` reverts the whole dispatch
    fn call(&mut self, caller: &Address, value: u128, data: &[u8]) -> Result<(), String>;
}

impl<F> CallTarget for F
where
    F: FnMut(&Address, u128, &[u8]) -> Result<(), String> + Send + Sync,
{
    fn call(&mut self, caller: &Address, value: u128, data: &[u8]) -> Result<(), String> {
        self(caller, value, data)
    }
}

/// Native balances plus call targets
///
/// Balances are persisted with the ledger; call targets are wired up at
/// runtime and never serialized.
#[derive(Default, Serialize, Deserialize)]
pub struct Treasury {
    balances: BTreeMap<Address, u128>,
    #[serde(skip)]
    targets: HashMap<Address, Box<dyn CallTarget>>,
}

impl Treasury {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance held by `address`
    pub fn balance_of(&self, address: &Address) -> u128 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Credit `amount` to `address`, returning the new balance
    pub fn deposit(&mut self, address: &Address, amount: u128) -> u128 {
        let balance = self.balances.entry(*address).or_insert(0);
        *balance = balance.saturating_add(amount);
        *balance
    }

    /// Register code at `address`, replacing any previous target
    pub fn register_target(&mut self, address: Address, target: Box<dyn CallTarget>) {
        self.targets.insert(address, target);
    }

    /// Whether `address` has registered code
    pub fn has_target(&self, address: &Address) -> bool {
        self.targets.contains_key(address)
    }

    /// All non-zero balances
    pub fn balances(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.balances.iter().filter(|(_, amount)| **amount > 0)
    }
}

impl Dispatcher for Treasury {
    fn dispatch(&mut self, source: &Address, call: &Call) -> Result<(), DispatchError> {
        let have = self.balance_of(source);
        if have < call.value {
            return Err(DispatchError::InsufficientBalance {
                have,
                need: call.value,
            });
        }

        if let Some(target) = self.targets.get_mut(&call.destination) {
            target
                .call(source, call.value, &call.data)
                .map_err(DispatchError::Reverted)?;
        }

        if call.value > 0 && call.destination != *source {
            self.balances.insert(*source, have - call.value);
            self.deposit(&call.destination, call.value);
        }

        log::debug!(
            "Dispatched {} from {} to {} ({} bytes of data)",
            format_native(call.value),
            source,
            call.destination,
            call.data.len()
        );

        Ok(())
    }
}

impl fmt::Debug for Treasury {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Treasury")
            .field("balances", &self.balances)
            .field("targets", &self.targets.keys().collect::<Vec<_>>())
            .finish()
    }
}
