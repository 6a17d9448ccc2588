//! Core primitives shared by the ledger, the API and the CLI
//!
//! - `Address`: 20-byte account identifiers
//! - Amount formatting in 18-decimal base units
//! - Hex encoding of opaque call payloads

pub mod address;
pub mod encoding;
pub mod units;

pub use address::{Address, AddressError, ADDRESS_LEN};
pub use encoding::{decode_payload, encode_payload};
pub use units::{
    format_native, format_units, parse_native, parse_units, UnitsError, NATIVE_DECIMALS, ONE_COIN,
};
