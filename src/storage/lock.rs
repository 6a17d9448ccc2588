//! Exclusive data directory lock
//!
//! A `.lock` file holding the owner's PID keeps two processes (say the API
//! server and a CLI command) from writing the same ledger. The file is
//! removed when the lock is dropped; a lock left behind by a dead process
//! is taken over.

use super::StorageError;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Lock file name inside the data directory
pub const LOCK_FILE: &str = ".lock";

/// Held lock on a data directory
#[derive(Debug)]
pub struct DataDirLock {
    path: PathBuf,
}

impl DataDirLock {
    /// Take the lock on `data_dir`, creating the directory if needed
    pub fn acquire(data_dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(LOCK_FILE);

        if let Some(pid) = Self::holder(data_dir) {
            if pid_alive(pid) {
                return Err(StorageError::Locked {
                    pid,
                    path: data_dir.to_path_buf(),
                });
            }
            log::warn!("Removing stale lock left by pid {} in {}", pid, data_dir.display());
            fs::remove_file(&path)?;
        } else if path.exists() {
            log::warn!("Removing unreadable lock file {}", path.display());
            fs::remove_file(&path)?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StorageError::Locked {
                    pid: Self::holder(data_dir).unwrap_or(0),
                    path: data_dir.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        write!(file, "{}", std::process::id())?;
        file.sync_all()?;

        log::debug!("Locked data directory {}", data_dir.display());
        Ok(Self { path })
    }

    /// PID recorded in the lock file of `data_dir`, if any
    pub fn holder(data_dir: &Path) -> Option<u32> {
        fs::read_to_string(data_dir.join(LOCK_FILE))
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(target_os = "linux")]
fn pid_alive(pid: u32) -> bool {
    fs::metadata(format!("/proc/{}", pid)).is_ok()
}

// Without /proc a recorded PID is assumed to be running
#[cfg(not(target_os = "linux"))]
fn pid_alive(_pid: u32) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_is_exclusive() {
        let dir = tempdir().unwrap();

        let lock = DataDirLock::acquire(dir.path()).unwrap();
        assert_eq!(DataDirLock::holder(dir.path()), Some(std::process::id()));

        match DataDirLock::acquire(dir.path()) {
            Err(StorageError::Locked { pid, .. }) => assert_eq!(pid, std::process::id()),
            other => panic!("expected Locked, got {:?}", other),
        }

        drop(lock);
        assert!(!dir.path().join(LOCK_FILE).exists());
        DataDirLock::acquire(dir.path()).unwrap();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_stale_lock_taken_over() {
        let dir = tempdir().unwrap();
        // Above the kernel's pid_max, so never a live process
        fs::write(dir.path().join(LOCK_FILE), "4194305").unwrap();

        let lock = DataDirLock::acquire(dir.path()).unwrap();
        assert_eq!(DataDirLock::holder(dir.path()), Some(std::process::id()));
        assert_eq!(lock.path(), dir.path().join(LOCK_FILE));
    }

    #[test]
    fn test_garbled_lock_replaced() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(LOCK_FILE), "not a pid").unwrap();

        let _lock = DataDirLock::acquire(dir.path()).unwrap();
        assert_eq!(DataDirLock::holder(dir.path()), Some(std::process::id()));
    }
}
