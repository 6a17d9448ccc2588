//! Native amount formatting
//!
//! Amounts are held as integer base units. The native currency uses 18
//! decimals, so `1_000_000_000_000_000_000` base units display as `1.0`.

use thiserror::Error;

/// Decimals of the native currency
pub const NATIVE_DECIMALS: u8 = 18;

/// Base units in one whole native coin
pub const ONE_COIN: u128 = 1_000_000_000_000_000_000;

/// Errors produced while parsing a decimal amount
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("Empty amount")]
    Empty,
    #[error("Invalid amount: {0}")]
    InvalidNumber(String),
    #[error("Too many decimal places: {got} (max {max})")]
    TooManyDecimals { got: usize, max: u8 },
    #[error("Amount overflows: {0}")]
    Overflow(String),
}

/// Render base units as a decimal string with at least one fractional digit
pub fn format_units(value: u128, decimals: u8) -> String {
    if decimals == 0 {
        return format!("{}.0", value);
    }

    let scale = 10u128.pow(decimals as u32);
    let whole = value / scale;
    let fraction = value % scale;

    let mut fraction_str = format!("{:0width$}", fraction, width = decimals as usize);
    while fraction_str.len() > 1 && fraction_str.ends_with('0') {
        fraction_str.pop();
    }

    format!("{}.{}", whole, fraction_str)
}

/// Parse a decimal string such as `"0.5"` into base units
pub fn parse_units(amount: &str, decimals: u8) -> Result<u128, UnitsError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole_str, fraction_str) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };

    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole_str.is_empty() && fraction_str.is_empty())
        || !digits_only(whole_str)
        || !digits_only(fraction_str)
    {
        return Err(UnitsError::InvalidNumber(amount.to_string()));
    }

    if fraction_str.len() > decimals as usize {
        return Err(UnitsError::TooManyDecimals {
            got: fraction_str.len(),
            max: decimals,
        });
    }

    let overflow = || UnitsError::Overflow(amount.to_string());
    let scale = 10u128.checked_pow(decimals as u32).ok_or_else(overflow)?;

    let whole: u128 = if whole_str.is_empty() {
        0
    } else {
        whole_str.parse().map_err(|_| overflow())?
    };

    let fraction: u128 = if fraction_str.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction_str, width = decimals as usize);
        padded.parse().map_err(|_| overflow())?
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(overflow)
}

/// Format native base units, e.g. `0.5`
pub fn format_native(value: u128) -> String {
    format_units(value, NATIVE_DECIMALS)
}

/// Parse a native decimal amount into base units
pub fn parse_native(amount: &str) -> Result<u128, UnitsError> {
    parse_units(amount, NATIVE_DECIMALS)
}
