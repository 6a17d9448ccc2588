//! Hex encoding for opaque call payloads
//!
//! Payloads travel as `0x`-prefixed hex strings; `"0x"` is the empty payload.

use serde::{Deserialize, Deserializer, Serializer};

/// Encode bytes as `0x`-prefixed lowercase hex
pub fn encode_payload(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Decode a hex payload; the `0x` prefix is optional
pub fn decode_payload(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let s = s.trim();
    let body = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(body)
}

/// Serde adapter for `Vec<u8>` fields stored as hex payloads
pub mod payload_hex {
    use super::*;

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_payload(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_payload(&s).map_err(serde::de::Error::custom)
    }
}
