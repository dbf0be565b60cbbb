use rust_decimal::Decimal;
use std::str::FromStr;

use crate::utils::error::{AppError, Result};

/// Turn a loosely formatted amount ("$1,299.99", " 299.99 USD") into a decimal.
///
/// Every character other than an ASCII digit or `.` is dropped before parsing.
/// Nothing left, or more than one decimal point, is `InvalidFormat`; a failed
/// parse is never read as zero.
pub fn normalize(raw: &str) -> Result<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() || cleaned == "." {
        return Err(AppError::InvalidFormat(raw.to_string()));
    }

    Decimal::from_str(&cleaned).map_err(|_| AppError::InvalidFormat(raw.to_string()))
}

/// Like [`normalize`], but only accepts amounts above zero.
pub fn normalize_positive(raw: &str) -> Result<Decimal> {
    let amount = normalize(raw)?;
    if amount > Decimal::ZERO {
        Ok(amount)
    } else {
        Err(AppError::InvalidFormat(raw.to_string()))
    }
}
