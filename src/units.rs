//! Conversion between decimal value strings and integer base units
//!
//! Balances are held as `u128` base units. Callers usually think in whole
//! tokens ("1.5 ether"), so these helpers go through `BigDecimal` to parse
//! without floating point loss.

use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::BigDecimal;
use std::str::FromStr;

use crate::types::*;

/// Decimals of the native value unit (ether → wei)
pub const ETHER_DECIMALS: u32 = 18;

/// Decimal digits in `u128::MAX`
const U128_MAX_DIGITS: i128 = 39;

/// Parse a decimal amount into base units with the given number of decimals
pub fn parse_units(value: &str, decimals: u32) -> LedgerResult<u128> {
    let amount = BigDecimal::from_str(value.trim())
        .map_err(|e| LedgerError::InvalidAmount(format!("'{}': {}", value, e)))?;

    match amount.sign() {
        Sign::Minus => {
            return Err(LedgerError::InvalidAmount(format!(
                "'{}' is negative",
                value
            )))
        }
        Sign::NoSign => return Ok(0),
        Sign::Plus => {}
    }

    // Exponents come straight from the input, so bound the digit count
    // before anything is scaled.
    let (_, exponent) = amount.as_bigint_and_exponent();
    let significant = i128::from(amount.digits());
    let excess_fraction = i128::from(exponent) - i128::from(decimals);
    if excess_fraction >= significant {
        return Err(LedgerError::InvalidAmount(format!(
            "'{}' has more than {} decimal places",
            value, decimals
        )));
    }
    if significant - excess_fraction > U128_MAX_DIGITS {
        return Err(LedgerError::ArithmeticOverflow(format!(
            "'{}' does not fit in base units",
            value
        )));
    }

    let scale = BigDecimal::new(BigInt::from(1), -i64::from(decimals));
    let scaled = amount * scale;
    let whole = scaled.with_scale(0);
    if whole != scaled {
        return Err(LedgerError::InvalidAmount(format!(
            "'{}' has more than {} decimal places",
            value, decimals
        )));
    }

    let (digits, _) = whole.into_bigint_and_exponent();
    u128::try_from(digits).map_err(|_| {
        LedgerError::ArithmeticOverflow(format!("'{}' does not fit in base units", value))
    })
}

/// Parse an ether amount into wei
pub fn parse_ether(value: &str) -> LedgerResult<u128> {
    parse_units(value, ETHER_DECIMALS)
}

/// Render base units as a decimal string without trailing zeros
pub fn format_units(amount: u128, decimals: u32) -> String {
    let Some(unit) = 10u128.checked_pow(decimals) else {
        // Every u128 is below one whole unit at this precision.
        let digits = amount.to_string();
        let pad = decimals as usize - digits.len();
        return trim_fraction(format!("0.{}{}", "0".repeat(pad), digits));
    };

    let whole = amount / unit;
    let fraction = amount % unit;
    if fraction == 0 {
        return whole.to_string();
    }

    trim_fraction(format!(
        "{}.{:0width$}",
        whole,
        fraction,
        width = decimals as usize
    ))
}

/// Render wei as ether
pub fn format_ether(amount: u128) -> String {
    format_units(amount, ETHER_DECIMALS)
}

fn trim_fraction(rendered: String) -> String {
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
