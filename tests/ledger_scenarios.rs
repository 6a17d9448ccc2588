//! End-to-end governance scenarios with real owner keys, a treasury with
//! registered call targets, and persistence between steps.

use multisig_ledger::api::auth::{IndexBody, SignedRequest, SubmitBody, ACTION_CONFIRM, ACTION_SUBMIT};
use multisig_ledger::core::{Address, ONE_COIN};
use multisig_ledger::crypto::KeyPair;
use multisig_ledger::multisig::{LedgerError, LedgerEvent, MultisigWallet, OwnerSet, TransactionStatus};
use multisig_ledger::storage::Storage;
use std::sync::{Arc, Mutex};

struct Owners {
    keys: Vec<KeyPair>,
}

impl Owners {
    fn new(n: usize) -> Self {
        Self {
            keys: (0..n).map(|_| KeyPair::generate()).collect(),
        }
    }

    fn addr(&self, i: usize) -> Address {
        self.keys[i].address()
    }

    fn addresses(&self) -> Vec<Address> {
        self.keys.iter().map(|k| k.address()).collect()
    }
}

fn token_contract() -> Address {
    Address::from_bytes([0xc0; 20])
}

#[test]
fn native_transfer_through_two_of_three() {
    let owners = Owners::new(3);
    let recipient = Address::from_bytes([0x55; 20]);
    let mut wallet = MultisigWallet::new(OwnerSet::new(owners.addresses(), 2).unwrap());
    wallet.deposit(owners.addr(0), ONE_COIN);

    let index = wallet
        .submit(&owners.addr(0), recipient, ONE_COIN / 2, vec![])
        .unwrap();
    assert_eq!(index, 0);
    assert_eq!(wallet.treasury.balance_of(&recipient), 0);

    let outcome = wallet.confirm(&owners.addr(1), index).unwrap();
    assert!(outcome.executed);
    assert_eq!(wallet.treasury.balance_of(&recipient), ONE_COIN / 2);
    assert_eq!(wallet.balance(), ONE_COIN / 2);

    // A third confirmation after execution is refused
    assert_eq!(
        wallet.confirm(&owners.addr(2), index),
        Err(LedgerError::AlreadyExecuted(index))
    );
}

#[test]
fn reverting_target_keeps_transaction_pending() {
    let owners = Owners::new(3);
    let mut wallet = MultisigWallet::new(OwnerSet::new(owners.addresses(), 2).unwrap());
    wallet.treasury.register_target(
        token_contract(),
        Box::new(|_: &Address, _: u128, _: &[u8]| -> Result<(), String> {
            Err("Tx failed".to_string())
        }),
    );

    let index = wallet
        .submit(&owners.addr(0), token_contract(), 0, vec![0xa9, 0x05, 0x9c, 0xbb])
        .unwrap();

    match wallet.confirm(&owners.addr(1), index) {
        Err(LedgerError::ExecutionFailed { index: i, reason }) => {
            assert_eq!(i, index);
            assert!(reason.contains("Tx failed"));
        }
        other => panic!("expected execution failure, got {:?}", other),
    }

    let tx = wallet.ledger.transaction(index).unwrap();
    assert!(!tx.executed);
    assert_eq!(tx.confirmation_count(), 2);
    assert_eq!(tx.status(2), TransactionStatus::DispatchFailed);
    assert!(matches!(
        wallet.ledger.events().last().map(|r| &r.event),
        Some(LedgerEvent::ExecutionFailure { .. })
    ));
}

#[test]
fn third_owner_retries_after_target_recovers() {
    let owners = Owners::new(3);
    let mut wallet = MultisigWallet::new(OwnerSet::new(owners.addresses(), 2).unwrap());

    let healthy = Arc::new(Mutex::new(false));
    let calls = Arc::new(Mutex::new(Vec::new()));
    {
        let healthy = healthy.clone();
        let calls = calls.clone();
        wallet.treasury.register_target(
            token_contract(),
            Box::new(move |caller: &Address, _: u128, data: &[u8]| -> Result<(), String> {
                if !*healthy.lock().unwrap() {
                    return Err("paused".to_string());
                }
                calls.lock().unwrap().push((*caller, data.to_vec()));
                Ok(())
            }),
        );
    }

    let index = wallet
        .submit(&owners.addr(0), token_contract(), 0, vec![1, 2, 3])
        .unwrap();
    assert!(wallet.confirm(&owners.addr(1), index).is_err());

    *healthy.lock().unwrap() = true;
    let outcome = wallet.confirm(&owners.addr(2), index).unwrap();
    assert!(outcome.executed);
    assert_eq!(outcome.confirmations, 3);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], (wallet.address(), vec![1, 2, 3]));
}

#[test]
fn independent_transactions_progress_separately() {
    let owners = Owners::new(3);
    let mut wallet = MultisigWallet::new(OwnerSet::new(owners.addresses(), 2).unwrap());
    wallet.deposit(owners.addr(2), 3 * ONE_COIN);

    let a = Address::from_bytes([0xaa; 20]);
    let b = Address::from_bytes([0xbb; 20]);
    let first = wallet.submit(&owners.addr(0), a, ONE_COIN, vec![]).unwrap();
    let second = wallet.submit(&owners.addr(1), b, ONE_COIN, vec![]).unwrap();
    assert_eq!((first, second), (0, 1));

    // Confirming the second leaves the first untouched
    assert!(wallet.confirm(&owners.addr(2), second).unwrap().executed);
    assert!(!wallet.ledger.transaction(first).unwrap().executed);
    assert_eq!(wallet.ledger.pending_transactions().len(), 1);

    wallet.revoke(&owners.addr(0), first).unwrap();
    assert_eq!(wallet.ledger.confirmations(first).unwrap(), Vec::<Address>::new());
    assert!(!wallet.confirm(&owners.addr(1), first).unwrap().executed);
    assert!(wallet.confirm(&owners.addr(0), first).unwrap().executed);

    assert_eq!(wallet.treasury.balance_of(&a), ONE_COIN);
    assert_eq!(wallet.treasury.balance_of(&b), ONE_COIN);
    assert_eq!(wallet.balance(), ONE_COIN);
}

#[test]
fn signed_requests_drive_the_ledger() {
    let owners = Owners::new(2);
    let mut wallet = MultisigWallet::new(OwnerSet::new(owners.addresses(), 2).unwrap());
    let destination = Address::from_bytes([0x11; 20]);

    let submit = SignedRequest::sign(
        ACTION_SUBMIT,
        SubmitBody::new(1, destination, 0, &[]),
        &owners.keys[1],
    )
    .unwrap();
    let caller = submit.verify(ACTION_SUBMIT).unwrap();
    assert_eq!(caller, owners.addr(1));
    let index = wallet.submit(&caller, destination, 0, vec![]).unwrap();

    let confirm = SignedRequest::sign(
        ACTION_CONFIRM,
        IndexBody { nonce: 1, index },
        &owners.keys[0],
    )
    .unwrap();
    let caller = confirm.verify(ACTION_CONFIRM).unwrap();
    assert!(wallet.confirm(&caller, index).unwrap().executed);
}

#[test]
fn ledger_survives_reload_between_steps() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::in_dir(dir.path()).unwrap();
    let owners = Owners::new(3);
    let recipient = Address::from_bytes([0x77; 20]);

    let mut wallet = MultisigWallet::new(OwnerSet::new(owners.addresses(), 2).unwrap());
    wallet.deposit(owners.addr(0), 2 * ONE_COIN);
    wallet
        .submit(&owners.addr(0), recipient, ONE_COIN, vec![])
        .unwrap();
    storage.save(&wallet).unwrap();

    let mut wallet = storage.load().unwrap();
    assert_eq!(wallet.balance(), 2 * ONE_COIN);
    assert!(wallet.ledger.is_confirmed(0, &owners.addr(0)).unwrap());
    assert!(wallet.confirm(&owners.addr(2), 0).unwrap().executed);
    storage.save(&wallet).unwrap();

    let wallet = storage.load().unwrap();
    assert_eq!(wallet.treasury.balance_of(&recipient), ONE_COIN);
    assert_eq!(wallet.ledger.status().executed, 1);
    assert_eq!(storage.list_backups(), vec![0]);
}
