//! Value parsers for command-line arguments, and the checks that span
//! more than one argument.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

const MAX_NOTE_CHARS: usize = 280;

/// Invalid combination of otherwise well-formed arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("--usdc is required for buy orders")]
    MissingUsdc,
    #[error("--quantity is required for sell orders")]
    MissingQuantity,
    #[error("--side must be buy or sell")]
    UnsupportedSide,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        "VALIDATION_ERROR"
    }
}

/// A strictly positive decimal, e.g. `--max-usdc 250` or `--quantity 0.5`.
pub fn positive_decimal(raw: &str) -> Result<Decimal, String> {
    let value = Decimal::from_str(raw.trim()).map_err(|_| format!("'{}' is not a number", raw))?;
    if value <= Decimal::ZERO {
        return Err(format!("must be greater than 0, got {}", raw));
    }
    Ok(value)
}

/// Slippage tolerance in percent, within (0, 50].
pub fn slippage(raw: &str) -> Result<Decimal, String> {
    let value = positive_decimal(raw)?;
    if value > Decimal::from(50) {
        return Err(format!("must be at most 50, got {}", raw));
    }
    Ok(value)
}

/// An ERC-20 contract address: `0x` followed by 40 hex digits.
pub fn token_address(raw: &str) -> Result<String, String> {
    let hex = raw
        .strip_prefix("0x")
        .ok_or_else(|| format!("'{}' must start with 0x", raw))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("'{}' is not a 0x-prefixed 40 hex digit address", raw));
    }
    Ok(raw.to_string())
}

/// Any value that is not blank, trimmed. Used for agent names and trade ids.
pub fn non_empty(raw: &str) -> Result<String, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err("must not be empty".to_string());
    }
    Ok(value.to_string())
}

pub fn note(raw: &str) -> Result<String, String> {
    let count = raw.chars().count();
    if count > MAX_NOTE_CHARS {
        return Err(format!("at most {} characters, got {}", MAX_NOTE_CHARS, count));
    }
    Ok(raw.to_string())
}
