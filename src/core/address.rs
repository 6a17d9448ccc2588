//! Account addresses
//!
//! Addresses are 20-byte identifiers rendered as `0x`-prefixed lowercase hex.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of an address in bytes
pub const ADDRESS_LEN: usize = 20;

/// Errors produced while parsing an address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Address must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("Address must be {expected} hex characters, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("Address contains non-hex characters: {0}")]
    InvalidHex(String),
}

/// A 20-byte account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Build an address from raw bytes
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Whether this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// Abbreviated form for console output, e.g. `0x1234…cdef`
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}…{}", &full[..6], &full[full.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(s.to_string()))?;

        if body.len() != ADDRESS_LEN * 2 {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_LEN * 2,
                got: body.len(),
            });
        }

        let decoded = hex::decode(body).map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        let addr: Address = "0xAbCdEf0123456789abcdef0123456789ABCDEF01".parse().unwrap();
        assert_eq!(
            addr.to_string(),
            "0xabcdef0123456789abcdef0123456789abcdef01"
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            "abcdef0123456789abcdef0123456789abcdef01".parse::<Address>(),
            Err(AddressError::MissingPrefix(_))
        ));
        assert!(matches!(
            "0x1234".parse::<Address>(),
            Err(AddressError::InvalidLength { got: 4, .. })
        ));
        assert!(matches!(
            "0xzzcdef0123456789abcdef0123456789abcdef01".parse::<Address>(),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_zero_and_short() {
        assert!(Address::ZERO.is_zero());
        let addr = Address::from_bytes([0xab; ADDRESS_LEN]);
        assert!(!addr.is_zero());
        assert_eq!(addr.short(), "0xabab…abab");
    }

    #[test]
    fn test_serde_as_string() {
        let addr = Address::from_bytes([0x11; ADDRESS_LEN]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x1111111111111111111111111111111111111111\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
