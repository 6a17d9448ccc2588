//! CLI commands for the multisig ledger
//!
//! Implements all command handlers for the CLI interface.

use crate::core::{decode_payload, encode_payload, format_native, parse_native, Address};
use crate::multisig::{LedgerError, LedgerEvent, MultisigWallet, OwnerSet, TransactionStatus};
use crate::storage::{DataDirLock, Storage};
use crate::wallet::Keystore;
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Directory under the data dir holding owner keys
pub const KEYS_DIR: &str = "keys";

/// Open the keystore under `data_dir`
pub fn open_keystore(data_dir: &Path) -> CliResult<Keystore> {
    Ok(Keystore::new(&data_dir.join(KEYS_DIR))?)
}

/// Application state
pub struct AppState {
    pub wallet: MultisigWallet,
    pub storage: Storage,
    pub keystore: Keystore,
    pub data_dir: PathBuf,
    /// Held for commands that write the ledger
    lock: Option<DataDirLock>,
}

impl AppState {
    /// Load an initialized ledger from `data_dir` for writing
    ///
    /// Fails while another process (such as a running API server) holds the
    /// data directory.
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let lock = DataDirLock::acquire(&data_dir)?;
        Self::open(data_dir, Some(lock))
    }

    /// Load an initialized ledger for inspection only
    pub fn read_only(data_dir: PathBuf) -> CliResult<Self> {
        Self::open(data_dir, None)
    }

    fn open(data_dir: PathBuf, lock: Option<DataDirLock>) -> CliResult<Self> {
        let storage = Storage::in_dir(data_dir.clone())?;

        if !storage.exists() {
            return Err(format!(
                "No ledger found in {:?}. Create one with: multisig init",
                data_dir
            )
            .into());
        }

        let wallet = storage.load()?;
        let keystore = open_keystore(&data_dir)?;

        Ok(Self {
            wallet,
            storage,
            keystore,
            data_dir,
            lock,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        if self.lock.is_none() {
            return Err("Ledger was opened read-only".into());
        }
        self.storage.save(&self.wallet)?;
        Ok(())
    }

    /// Check that this machine holds the key for `owner`
    fn require_key(&self, owner: &Address) -> CliResult<()> {
        self.keystore.load_key(owner)?;
        Ok(())
    }

    /// Persist the outcome of a ledger operation
    ///
    /// A failed dispatch still changed the ledger, so it is saved before the
    /// error is returned.
    fn commit<T>(&self, result: Result<T, LedgerError>) -> CliResult<T> {
        match result {
            Ok(value) => {
                self.save()?;
                Ok(value)
            }
            Err(e) => {
                if !e.is_non_mutating() {
                    self.save()?;
                }
                Err(e.into())
            }
        }
    }
}

fn parse_address(s: &str) -> CliResult<Address> {
    s.parse::<Address>()
        .map_err(|e| format!("Invalid address '{}': {}", s, e).into())
}

/// Initialize a new ledger
///
/// With `force`, an existing ledger is replaced only after the new owner set
/// validates; the old file is kept as backup 0.
pub fn cmd_init(data_dir: &Path, owners: &[String], required: usize, force: bool) -> CliResult<()> {
    let owners = owners
        .iter()
        .map(|s| parse_address(s))
        .collect::<CliResult<Vec<_>>>()?;
    let owner_set = OwnerSet::new(owners, required)?;

    let _lock = DataDirLock::acquire(data_dir)?;
    let storage = Storage::in_dir(data_dir)?;

    if storage.exists() && !force {
        println!("⚠️  Ledger already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (the current ledger becomes backup 0)");
        return Ok(());
    }

    let wallet = MultisigWallet::new(owner_set);
    storage.save(&wallet)?;

    println!("✅ Ledger initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   📍 Wallet address: {}", wallet.address());
    println!(
        "   🔐 Policy: {}",
        wallet.ledger.owner_set().description()
    );
    for owner in wallet.ledger.owners() {
        println!("   └─ {}", owner);
    }

    Ok(())
}

/// Create a new owner key
pub fn cmd_key_new(keystore: &Keystore, label: Option<&str>) -> CliResult<()> {
    let key = keystore.create_key(label)?;

    println!("🔐 New owner key created!");
    println!("   📍 Address: {}", key.address());
    println!("   🔑 Public Key: {}", key.public_key());
    if let Some(l) = &key.label {
        println!("   🏷️  Label: {}", l);
    }
    println!("\n   ⚠️  IMPORTANT: The private key is stored in the keys directory.");
    println!("   Back up this directory to avoid losing signing access!");

    Ok(())
}

/// Import an existing owner key
pub fn cmd_key_import(keystore: &Keystore, private_key: &str, label: Option<&str>) -> CliResult<()> {
    let key = keystore.import_key(private_key, label)?;
    println!("📥 Key imported: {}", key.address());
    Ok(())
}

/// List stored owner keys
pub fn cmd_key_list(keystore: &Keystore) -> CliResult<()> {
    let keys = keystore.list_keys()?;

    if keys.is_empty() {
        println!("📭 No keys found. Create one with: multisig key new");
        return Ok(());
    }

    println!("📋 Owner keys:");
    for key in &keys {
        let label = key.label.as_deref().unwrap_or("-");
        println!("   {} ({})", key.address, label);
    }

    Ok(())
}

/// Deposit native funds into the wallet
pub fn cmd_fund(state: &mut AppState, from: &str, amount: &str) -> CliResult<()> {
    let from = parse_address(from)?;
    let amount = parse_native(amount)?;
    if amount == 0 {
        return Err("Deposit amount must be positive".into());
    }

    let balance = state.wallet.deposit(from, amount);
    state.save()?;

    println!("💰 Deposited {} from {}", format_native(amount), from);
    println!("   New balance: {}", format_native(balance));

    Ok(())
}

/// Propose a call as `from`
pub fn cmd_submit(
    state: &mut AppState,
    from: &str,
    to: &str,
    value: &str,
    data: Option<&str>,
) -> CliResult<()> {
    let caller = parse_address(from)?;
    let destination = parse_address(to)?;
    let value = parse_native(value)?;
    let data = match data {
        Some(d) => decode_payload(d)?,
        None => Vec::new(),
    };
    state.require_key(&caller)?;

    let result = state.wallet.submit(&caller, destination, value, data);
    let index = state.commit(result)?;
    let tx = state.wallet.ledger.transaction(index)?;

    println!("📤 Transaction {} submitted", index);
    println!("   To: {}", destination);
    println!("   Value: {}", format_native(value));
    if !tx.data().is_empty() {
        println!("   Data: {}", encode_payload(tx.data()));
    }
    println!(
        "   Confirmations: {}/{}",
        tx.confirmation_count(),
        state.wallet.ledger.required_confirmations()
    );
    if tx.executed {
        println!("\n✅ Transaction executed");
    }

    Ok(())
}

/// Confirm a transaction as `from`
pub fn cmd_confirm(state: &mut AppState, from: &str, index: usize) -> CliResult<()> {
    let caller = parse_address(from)?;
    state.require_key(&caller)?;

    let result = state.wallet.confirm(&caller, index);
    let outcome = state.commit(result)?;

    println!(
        "✍️  Transaction {} confirmed by {} ({}/{})",
        index,
        caller.short(),
        outcome.confirmations,
        state.wallet.ledger.required_confirmations()
    );
    if outcome.executed {
        println!("\n✅ Transaction executed");
    }

    Ok(())
}

/// Withdraw a confirmation as `from`
pub fn cmd_revoke(state: &mut AppState, from: &str, index: usize) -> CliResult<()> {
    let caller = parse_address(from)?;
    state.require_key(&caller)?;

    let result = state.wallet.revoke(&caller, index);
    let confirmations = state.commit(result)?;

    println!(
        "↩️  Confirmation on transaction {} revoked by {} ({}/{})",
        index,
        caller.short(),
        confirmations,
        state.wallet.ledger.required_confirmations()
    );

    Ok(())
}

/// Display one transaction
pub fn cmd_show(state: &AppState, index: usize) -> CliResult<()> {
    let ledger = &state.wallet.ledger;
    let tx = ledger.transaction(index)?;
    let required = ledger.required_confirmations();

    let status = match tx.status(required) {
        TransactionStatus::Executed => "✅ Executed",
        TransactionStatus::DispatchFailed => "❌ Dispatch failed",
        TransactionStatus::AwaitingConfirmations => "⏳ Awaiting confirmations",
    };

    println!("📄 Transaction {}", index);
    println!("   ├─ Status: {}", status);
    println!("   ├─ Destination: {}", tx.destination());
    println!("   ├─ Value: {}", format_native(tx.value()));
    println!("   ├─ Data: {}", encode_payload(tx.data()));
    println!("   ├─ Submitted by: {}", tx.submitted_by);
    println!(
        "   ├─ Submitted at: {}",
        tx.submitted_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(reason) = &tx.last_failure {
        println!("   ├─ Last failure: {}", reason);
    }
    println!(
        "   └─ Confirmations: {}/{}",
        tx.confirmation_count(),
        required
    );
    for owner in ledger.confirmations(index)? {
        println!("      └─ {}", owner);
    }

    println!("   📜 History:");
    for record in ledger.transaction_history(index) {
        println!(
            "      {} | {}",
            record.at.format("%Y-%m-%d %H:%M:%S"),
            describe_event(&record.event)
        );
    }

    Ok(())
}

/// List unexecuted transactions
pub fn cmd_pending(state: &AppState) -> CliResult<()> {
    let ledger = &state.wallet.ledger;
    let pending = ledger.pending_transactions();
    let required = ledger.required_confirmations();

    if pending.is_empty() {
        println!("📭 No pending transactions");
        return Ok(());
    }

    println!("📬 Pending transactions: {}", pending.len());
    for tx in pending {
        let flag = if tx.last_failure.is_some() { " ❌" } else { "" };
        println!(
            "   #{} | {} → {} | {}/{}{}",
            tx.index,
            format_native(tx.value()),
            tx.destination().short(),
            tx.confirmation_count(),
            required,
            flag
        );
    }

    Ok(())
}

/// Display ledger info
pub fn cmd_status(state: &AppState) -> CliResult<()> {
    let status = state.wallet.ledger.status();

    println!("🔐 Multisig Ledger");
    println!("   ├─ Address: {}", status.address);
    println!(
        "   ├─ Policy: {}",
        state.wallet.ledger.owner_set().description()
    );
    println!("   ├─ Balance: {}", format_native(state.wallet.balance()));
    println!("   ├─ Transactions: {}", status.transaction_count);
    println!("   ├─ Pending: {}", status.pending);
    println!("   ├─ Executed: {}", status.executed);
    let stats = state.storage.stats()?;
    println!(
        "   ├─ Storage: {} bytes, {} backup(s)",
        stats.file_size, stats.backup_count
    );
    println!("   ├─ Holdings:");
    for (holder, amount) in state.wallet.treasury.balances() {
        println!("   │  └─ {}: {}", holder, format_native(*amount));
    }
    println!("   └─ Owners:");
    for owner in &status.owners {
        let marker = if state.keystore.load_key(owner).is_ok() {
            " 🔑"
        } else {
            ""
        };
        println!("      └─ {}{}", owner, marker);
    }

    Ok(())
}

/// One-line summary of a ledger event
fn describe_event(event: &LedgerEvent) -> String {
    match event {
        LedgerEvent::Deposit { from, amount } => {
            format!("Deposit {} from {}", format_native(*amount), from.short())
        }
        LedgerEvent::Submission {
            index,
            owner,
            destination,
            value,
        } => format!(
            "Submission #{} by {}: {} to {}",
            index,
            owner.short(),
            format_native(*value),
            destination.short()
        ),
        LedgerEvent::Confirmation { index, owner } => {
            format!("Confirmation #{} by {}", index, owner.short())
        }
        LedgerEvent::Revocation { index, owner } => {
            format!("Revocation #{} by {}", index, owner.short())
        }
        LedgerEvent::Execution { index } => format!("Execution #{}", index),
        LedgerEvent::ExecutionFailure { index, reason } => {
            format!("ExecutionFailure #{}: {}", index, reason)
        }
    }
}

/// Replace the ledger with one of its backups; 0 is the most recent
pub fn cmd_restore(state: &mut AppState, backup: usize) -> CliResult<()> {
    let restored = state.storage.restore_backup(backup)?;
    if restored.address() != state.wallet.address() {
        return Err(format!(
            "Backup {} belongs to a different wallet ({})",
            backup,
            restored.address()
        )
        .into());
    }

    state.wallet = restored;
    state.save()?;

    println!("📥 Restored ledger from backup {}", backup);
    println!(
        "   Transactions: {}",
        state.wallet.ledger.transaction_count()
    );

    Ok(())
}

/// Print the most recent audit events
pub fn cmd_events(state: &AppState, limit: usize) -> CliResult<()> {
    let events = state.wallet.ledger.events();
    let start = events.len().saturating_sub(limit);

    println!("📜 Events ({} total):", events.len());
    for record in &events[start..] {
        let line = describe_event(&record.event);
        println!(
            "   {:>4} | {} | {}",
            record.sequence,
            record.at.format("%Y-%m-%d %H:%M:%S"),
            line
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ONE_COIN;

    fn setup(required: usize) -> (tempfile::TempDir, Vec<Address>) {
        let dir = tempfile::tempdir().unwrap();
        let keystore = open_keystore(dir.path()).unwrap();
        let owners: Vec<Address> = (0..3)
            .map(|_| keystore.create_key(None).unwrap().address())
            .collect();
        let owner_strings: Vec<String> = owners.iter().map(|a| a.to_string()).collect();

        cmd_init(dir.path(), &owner_strings, required, false).unwrap();
        (dir, owners)
    }

    #[test]
    fn test_init_requires_valid_policy() {
        let dir = tempfile::tempdir().unwrap();
        let owner = Address::from_bytes([1; 20]).to_string();

        assert!(cmd_init(dir.path(), &[owner.clone()], 2, false).is_err());
        assert!(cmd_init(dir.path(), &["nope".to_string()], 1, false).is_err());
        assert!(AppState::new(dir.path().to_path_buf()).is_err());

        cmd_init(dir.path(), &[owner], 1, false).unwrap();
        assert!(AppState::new(dir.path().to_path_buf()).is_ok());
    }

    #[test]
    fn test_force_init_validates_before_replacing() {
        let (dir, owners) = setup(2);
        let original = AppState::read_only(dir.path().to_path_buf())
            .unwrap()
            .wallet
            .address();
        let owner = owners[0].to_string();

        // An invalid policy leaves the existing ledger alone
        assert!(cmd_init(dir.path(), &[owner.clone()], 5, true).is_err());
        let state = AppState::read_only(dir.path().to_path_buf()).unwrap();
        assert_eq!(state.wallet.address(), original);
        assert!(state.storage.list_backups().is_empty());

        // A valid one replaces it and keeps the old ledger as backup 0
        cmd_init(dir.path(), &[owner], 1, true).unwrap();
        let state = AppState::read_only(dir.path().to_path_buf()).unwrap();
        assert_eq!(state.wallet.ledger.required_confirmations(), 1);
        assert_eq!(state.storage.list_backups(), vec![0]);
        let previous = state.storage.restore_backup(0).unwrap();
        assert_eq!(previous.address(), original);
    }

    #[test]
    fn test_writes_blocked_while_data_dir_locked() {
        let (dir, owners) = setup(2);
        let server_lock = DataDirLock::acquire(dir.path()).unwrap();

        assert!(AppState::new(dir.path().to_path_buf()).is_err());
        assert!(cmd_init(dir.path(), &[owners[0].to_string()], 1, true).is_err());

        // Inspection still works, saving does not
        let state = AppState::read_only(dir.path().to_path_buf()).unwrap();
        cmd_status(&state).unwrap();
        assert!(state.save().is_err());

        drop(server_lock);
        let mut state = AppState::new(dir.path().to_path_buf()).unwrap();
        cmd_fund(&mut state, &owners[0].to_string(), "1").unwrap();
    }

    #[test]
    fn test_submit_confirm_flow_persists() {
        let (dir, owners) = setup(2);
        let recipient = Address::from_bytes([9; 20]).to_string();

        let mut state = AppState::new(dir.path().to_path_buf()).unwrap();
        cmd_fund(&mut state, &owners[0].to_string(), "1").unwrap();
        cmd_submit(&mut state, &owners[0].to_string(), &recipient, "0.5", None).unwrap();

        drop(state);

        // Reload from disk between commands, as separate invocations would
        let mut state = AppState::new(dir.path().to_path_buf()).unwrap();
        cmd_confirm(&mut state, &owners[1].to_string(), 0).unwrap();
        drop(state);

        let state = AppState::read_only(dir.path().to_path_buf()).unwrap();
        assert!(state.wallet.ledger.transaction(0).unwrap().executed);
        assert_eq!(state.wallet.balance(), ONE_COIN / 2);
        cmd_show(&state, 0).unwrap();
        cmd_events(&state, 10).unwrap();
    }

    #[test]
    fn test_failed_dispatch_is_saved() {
        let (dir, owners) = setup(2);
        let recipient = Address::from_bytes([9; 20]).to_string();

        let mut state = AppState::new(dir.path().to_path_buf()).unwrap();
        cmd_submit(&mut state, &owners[0].to_string(), &recipient, "1", None).unwrap();
        assert!(cmd_confirm(&mut state, &owners[1].to_string(), 0).is_err());

        let state = AppState::read_only(dir.path().to_path_buf()).unwrap();
        let tx = state.wallet.ledger.transaction(0).unwrap();
        assert_eq!(tx.confirmation_count(), 2);
        assert!(tx.last_failure.is_some());
        cmd_pending(&state).unwrap();
    }

    #[test]
    fn test_signing_requires_local_key() {
        let (dir, _) = setup(1);
        let outsider = Address::from_bytes([7; 20]).to_string();

        let mut state = AppState::new(dir.path().to_path_buf()).unwrap();
        assert!(cmd_submit(&mut state, &outsider, &outsider, "0", None).is_err());
        assert_eq!(state.wallet.ledger.transaction_count(), 0);
    }

    #[test]
    fn test_revoke_roundtrip() {
        let (dir, owners) = setup(2);
        let recipient = Address::from_bytes([9; 20]).to_string();

        let mut state = AppState::new(dir.path().to_path_buf()).unwrap();
        cmd_submit(&mut state, &owners[0].to_string(), &recipient, "0", Some("0xdead")).unwrap();
        cmd_revoke(&mut state, &owners[0].to_string(), 0).unwrap();
        assert!(cmd_revoke(&mut state, &owners[0].to_string(), 0).is_err());

        let state = AppState::read_only(dir.path().to_path_buf()).unwrap();
        let tx = state.wallet.ledger.transaction(0).unwrap();
        assert_eq!(tx.confirmation_count(), 0);
        assert_eq!(tx.data().to_vec(), vec![0xde, 0xad]);
        cmd_status(&state).unwrap();
    }

    #[test]
    fn test_restore_previous_snapshot() {
        let (dir, owners) = setup(2);
        let recipient = Address::from_bytes([9; 20]).to_string();

        let mut state = AppState::new(dir.path().to_path_buf()).unwrap();
        cmd_submit(&mut state, &owners[0].to_string(), &recipient, "0", None).unwrap();
        cmd_submit(&mut state, &owners[1].to_string(), &recipient, "0", None).unwrap();
        assert_eq!(state.wallet.ledger.transaction_count(), 2);

        // Backup 0 is the snapshot taken before the second submission
        cmd_restore(&mut state, 0).unwrap();
        assert_eq!(state.wallet.ledger.transaction_count(), 1);
        assert!(cmd_restore(&mut state, 4).is_err());
    }
}
