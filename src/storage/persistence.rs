//! Wallet persistence layer
//!
//! Saves the ledger and treasury balances as one JSON document, writing to
//! a temporary file first and renaming it into place.

use crate::multisig::MultisigWallet;
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Data directory {path:?} is in use by process {pid}")]
    Locked { pid: u32, path: PathBuf },
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub ledger_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".multisig_data"),
            ledger_file: "ledger.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Wallet storage manager
#[derive(Debug)]
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager, creating the data directory if needed
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    /// Storage rooted at `data_dir` with default settings
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Self::new(StorageConfig {
            data_dir: data_dir.into(),
            ..Default::default()
        })
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.config.data_dir
    }

    fn ledger_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.ledger_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.ledger_file, index))
    }

    /// Save the wallet to disk
    pub fn save(&self, wallet: &MultisigWallet) -> Result<(), StorageError> {
        let path = self.ledger_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        let temp_path = self
            .config
            .data_dir
            .join(format!("{}.tmp", self.config.ledger_file));
        let file = fs::File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, wallet)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;

        fs::rename(&temp_path, &path)?;
        log::debug!("Saved ledger to {}", path.display());

        Ok(())
    }

    /// Load the wallet from disk
    pub fn load(&self) -> Result<MultisigWallet, StorageError> {
        let path = self.ledger_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Ledger file not found: {}",
                path.display()
            )));
        }

        Self::read(&path)
    }

    fn read(path: &Path) -> Result<MultisigWallet, StorageError> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Check if a saved ledger exists
    pub fn exists(&self) -> bool {
        self.ledger_path().exists()
    }

    /// Shift backups up by one, dropping the oldest
    fn rotate_backups(&self) -> Result<(), StorageError> {
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// Load a backup; 0 is the most recent
    pub fn restore_backup(&self, backup_index: usize) -> Result<MultisigWallet, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        Self::read(&backup_path)
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let path = self.ledger_path();

        let file_size = if path.exists() {
            fs::metadata(&path)?.len()
        } else {
            0
        };

        Ok(StorageStats {
            file_size,
            backup_count: self.list_backups().len(),
            data_dir: self.config.data_dir.clone(),
        })
    }
}

/// Storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub file_size: u64,
    pub backup_count: usize,
    pub data_dir: PathBuf,
}
