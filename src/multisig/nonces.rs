//! Per-owner replay counters for signed requests
//!
//! Persisted with the wallet so a restart never accepts an old request again.

use crate::core::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A request nonce that is not newer than the last accepted one
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Stale nonce {nonce} for {caller} (last used {last})")]
pub struct StaleNonce {
    pub caller: Address,
    pub nonce: u64,
    pub last: u64,
}

/// Last nonce accepted from each owner
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NonceRegistry {
    last_seen: BTreeMap<Address, u64>,
}

impl NonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last nonce accepted from `caller`
    pub fn last(&self, caller: &Address) -> Option<u64> {
        self.last_seen.get(caller).copied()
    }

    /// Accept `nonce` from `caller` if it is newer than the last one
    pub fn check_and_record(&mut self, caller: Address, nonce: u64) -> Result<(), StaleNonce> {
        if let Some(last) = self.last(&caller) {
            if nonce <= last {
                return Err(StaleNonce {
                    caller,
                    nonce,
                    last,
                });
            }
        }
        self.last_seen.insert(caller, nonce);
        Ok(())
    }
}
