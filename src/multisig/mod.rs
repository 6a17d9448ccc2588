//! Multisig transaction ledger
//!
//! A fixed set of owners proposes calls; each call executes once
//! `required` distinct owners have confirmed it.
//!
//! # Example
//!
//! ```ignore
//! use multisig_ledger::multisig::{Ledger, OwnerSet, Treasury};
//!
//! // 2-of-3 ledger
//! let owners = OwnerSet::new(vec![alice, bob, carol], 2)?;
//! let mut ledger = Ledger::new(owners);
//! let mut treasury = Treasury::new();
//! treasury.deposit(ledger.address(), amount);
//!
//! // Alice proposes (and implicitly confirms), Bob's confirmation executes it
//! let index = ledger.submit(&alice, recipient, amount, vec![], &mut treasury)?;
//! let outcome = ledger.confirm(&bob, index, &mut treasury)?;
//! assert!(outcome.executed);
//! ```

pub mod dispatch;
pub mod error;
pub mod events;
pub mod ledger;
pub mod nonces;
pub mod owners;
pub mod transaction;
pub mod wallet;

pub use dispatch::{CallTarget, DispatchError, Dispatcher, Treasury};
pub use error::LedgerError;
pub use events::{EventRecord, LedgerEvent};
pub use ledger::{ConfirmOutcome, Ledger, LedgerStatus};
pub use nonces::{NonceRegistry, StaleNonce};
pub use owners::OwnerSet;
pub use transaction::{Call, Transaction, TransactionStatus};
pub use wallet::MultisigWallet;
