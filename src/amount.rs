//! Decimal-aware amount encoding
//!
//! Converts human readable amounts ("1.5" SOL, "1000.25" tokens) into the raw
//! `u64` integers programs expect, and back.
//!
//! Encoding always truncates toward zero. A maximum-spend argument built from
//! "0.0123456789" SOL must never encode more lamports than the caller wrote,
//! so extra precision is dropped instead of rounded.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimals of the native SOL unit (lamports)
pub const SOL_DECIMALS: u8 = 9;

/// Highest precision the codec can represent exactly
pub const MAX_DECIMALS: u8 = 28;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Invalid amount '{input}': {reason}")]
    Parse { input: String, reason: String },

    #[error("Invalid amount '{0}': negative amounts are not allowed")]
    Negative(String),

    #[error("Amount '{input}' with {decimals} decimals does not fit in u64")]
    Overflow { input: String, decimals: u8 },

    #[error("Decimals out of range: {0} (max {MAX_DECIMALS})")]
    DecimalsOutOfRange(u8),
}

/// Parse `amount` and scale it by `10^decimals`, truncating toward zero.
///
/// # Errors
///
/// Fails on unparseable or negative input, when the scaled value does not fit
/// in a `u64`, or when `decimals` exceeds [`MAX_DECIMALS`].
pub fn to_raw_amount(amount: &str, decimals: u8) -> Result<u64, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::DecimalsOutOfRange(decimals));
    }

    let parse_error = |reason: String| AmountError::Parse {
        input: amount.to_string(),
        reason,
    };

    let trimmed = amount.trim();
    let kept = truncate_fraction(trimmed, decimals).map_err(parse_error)?;
    let value = Decimal::from_str_exact(kept).map_err(|e| parse_error(e.to_string()))?;

    if trimmed.starts_with('-') {
        return Err(AmountError::Negative(amount.to_string()));
    }

    let overflow = || AmountError::Overflow {
        input: amount.to_string(),
        decimals,
    };

    let mantissa = value.mantissa();
    let scale = value.scale();
    let target = u32::from(decimals);

    let raw = if scale > target {
        // integer division on a non-negative mantissa truncates toward zero
        mantissa / pow10(scale - target).ok_or_else(overflow)?
    } else {
        mantissa
            .checked_mul(pow10(target - scale).ok_or_else(overflow)?)
            .ok_or_else(overflow)?
    };

    u64::try_from(raw).map_err(|_| overflow())
}

/// Render a raw integer amount as a canonical decimal string.
///
/// The output has no trailing fractional zeros, so
/// `from_raw_amount(to_raw_amount(s, d)?, d)? == s` for canonical `s`.
///
/// # Errors
///
/// Fails only when `decimals` exceeds [`MAX_DECIMALS`].
pub fn from_raw_amount(raw: u64, decimals: u8) -> Result<String, AmountError> {
    let value = Decimal::try_from_i128_with_scale(i128::from(raw), u32::from(decimals))
        .map_err(|_| AmountError::DecimalsOutOfRange(decimals))?;
    Ok(value.normalize().to_string())
}

/// Drop fractional digits beyond `decimals` so any input precision parses.
fn truncate_fraction(amount: &str, decimals: u8) -> Result<&str, String> {
    let Some((int_part, fraction)) = amount.split_once('.') else {
        return Ok(amount);
    };
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid fractional part '{fraction}'"));
    }
    let digits = int_part.trim_start_matches(['-', '+']);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid integer part '{int_part}'"));
    }

    let keep = fraction.len().min(usize::from(decimals));
    if keep == 0 {
        Ok(int_part)
    } else {
        Ok(&amount[..int_part.len() + 1 + keep])
    }
}

fn pow10(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

/// An amount paired with the decimals of its mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    /// Human readable amount, e.g. "1000.5"
    pub amount: String,
    /// Decimals of the token mint
    pub decimals: u8,
}

impl TokenAmount {
    pub fn new(amount: impl Into<String>, decimals: u8) -> Self {
        Self {
            amount: amount.into(),
            decimals,
        }
    }

    /// Amount denominated in SOL
    pub fn sol(amount: impl Into<String>) -> Self {
        Self::new(amount, SOL_DECIMALS)
    }

    pub fn to_raw(&self) -> Result<u64, AmountError> {
        to_raw_amount(&self.amount, self.decimals)
    }
}
