//! Owner set and confirmation threshold
//!
//! The owner set is fixed at construction. Its wallet address is derived
//! from the threshold and the sorted owners, so the same configuration
//! always maps to the same wallet.

use crate::core::{Address, ADDRESS_LEN};
use crate::crypto::sha256;
use crate::multisig::error::LedgerError;
use serde::{Deserialize, Serialize};

/// Owners authorized to submit, confirm and revoke, plus the quorum
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OwnerSetRecord")]
pub struct OwnerSet {
    owners: Vec<Address>,
    required: usize,
}

/// Unvalidated wire form of an owner set
#[derive(Deserialize)]
struct OwnerSetRecord {
    owners: Vec<Address>,
    required: usize,
}

impl TryFrom<OwnerSetRecord> for OwnerSet {
    type Error = LedgerError;

    fn try_from(record: OwnerSetRecord) -> Result<Self, Self::Error> {
        OwnerSet::new(record.owners, record.required)
    }
}

impl OwnerSet {
    /// Create a validated owner set
    ///
    /// # Errors
    /// Fails when the set is empty, contains duplicates, or `required` is
    /// outside `1..=owners.len()`.
    pub fn new(owners: Vec<Address>, required: usize) -> Result<Self, LedgerError> {
        if owners.is_empty() {
            return Err(LedgerError::NoOwners);
        }

        if required == 0 {
            return Err(LedgerError::InvalidThreshold(
                "required confirmations must be at least 1".to_string(),
            ));
        }

        if required > owners.len() {
            return Err(LedgerError::InvalidThreshold(format!(
                "required confirmations {} exceeds owner count {}",
                required,
                owners.len()
            )));
        }

        let mut sorted = owners.clone();
        sorted.sort();
        if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return Err(LedgerError::DuplicateOwner(pair[0]));
        }

        Ok(Self { owners, required })
    }

    /// Owners in construction order
    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    /// Confirmations needed to execute a transaction
    pub fn required(&self) -> usize {
        self.required
    }

    /// Number of owners
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Always false; an owner set is never empty
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Whether `address` is an owner
    pub fn contains(&self, address: &Address) -> bool {
        self.owners.contains(address)
    }

    /// Description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.required, self.owners.len())
    }

    /// Deterministic wallet address for this configuration
    ///
    /// Address = last 20 bytes of SHA-256("multisig" || required || sorted owners)
    pub fn wallet_address(&self) -> Address {
        let mut sorted = self.owners.clone();
        sorted.sort();

        let mut preimage = b"multisig".to_vec();
        preimage.extend_from_slice(&(self.required as u64).to_be_bytes());
        for owner in &sorted {
            preimage.extend_from_slice(owner.as_bytes());
        }

        let digest = sha256(&preimage);
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[digest.len() - ADDRESS_LEN..]);
        Address::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; ADDRESS_LEN])
    }

    #[test]
    fn test_owner_set_creation() {
        let set = OwnerSet::new(vec![addr(1), addr(2), addr(3)], 2).unwrap();
        assert_eq!(set.required(), 2);
        assert_eq!(set.len(), 3);
        assert_eq!(set.description(), "2-of-3");
        assert!(set.contains(&addr(2)));
        assert!(!set.contains(&addr(9)));
    }

    #[test]
    fn test_single_owner_allowed() {
        let set = OwnerSet::new(vec![addr(1)], 1).unwrap();
        assert_eq!(set.description(), "1-of-1");
    }

    #[test]
    fn test_owner_set_validation() {
        assert_eq!(OwnerSet::new(vec![], 1), Err(LedgerError::NoOwners));
        assert!(matches!(
            OwnerSet::new(vec![addr(1), addr(2)], 0),
            Err(LedgerError::InvalidThreshold(_))
        ));
        assert!(matches!(
            OwnerSet::new(vec![addr(1), addr(2)], 3),
            Err(LedgerError::InvalidThreshold(_))
        ));
        assert_eq!(
            OwnerSet::new(vec![addr(1), addr(2), addr(1)], 2),
            Err(LedgerError::DuplicateOwner(addr(1)))
        );
    }

    #[test]
    fn test_wallet_address_determinism() {
        let a = OwnerSet::new(vec![addr(1), addr(2), addr(3)], 2).unwrap();
        let b = OwnerSet::new(vec![addr(3), addr(1), addr(2)], 2).unwrap();
        let c = OwnerSet::new(vec![addr(1), addr(2), addr(3)], 3).unwrap();

        assert_eq!(a.wallet_address(), b.wallet_address());
        assert_ne!(a.wallet_address(), c.wallet_address());
    }

    #[test]
    fn test_deserialize_validates() {
        let json = format!(r#"{{"owners":["{}","{}"],"required":3}}"#, addr(1), addr(2));
        assert!(serde_json::from_str::<OwnerSet>(&json).is_err());

        let json = format!(r#"{{"owners":["{}","{}"],"required":2}}"#, addr(1), addr(2));
        let set: OwnerSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set.description(), "2-of-2");
    }
}
