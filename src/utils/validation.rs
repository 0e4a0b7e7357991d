//! Validation utilities

use crate::types::*;

/// Number of hex digits in an address body
pub const ADDRESS_HEX_LEN: usize = 40;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: u128) -> LedgerResult<()> {
    if amount == 0 {
        Err(LedgerError::InvalidAmount(
            "Amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that an address is `0x` followed by 40 hex digits
pub fn validate_address(raw: &str) -> LedgerResult<()> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(LedgerError::Validation(
            "Address cannot be empty".to_string(),
        ));
    }

    let body = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| {
            LedgerError::Validation(format!("Address '{}' must start with 0x", raw))
        })?;

    if body.len() != ADDRESS_HEX_LEN {
        return Err(LedgerError::Validation(format!(
            "Address '{}' must have {} hex digits, found {}",
            raw,
            ADDRESS_HEX_LEN,
            body.len()
        )));
    }

    if !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(LedgerError::Validation(format!(
            "Address '{}' contains non-hex characters",
            raw
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_address() {
        assert!(validate_address("0x00000000000000000000000000000000000000ff").is_ok());
        assert!(validate_address("0X00000000000000000000000000000000000000FF").is_ok());
        assert!(validate_address("").is_err());
        assert!(validate_address("00000000000000000000000000000000000000ff").is_err());
        assert!(validate_address("0x00ff").is_err());
        assert!(validate_address("0x00000000000000000000000000000000000000zz").is_err());
    }

    #[test]
    fn test_validate_positive_amount() {
        assert!(validate_positive_amount(1).is_ok());
        assert!(matches!(
            validate_positive_amount(0),
            Err(LedgerError::InvalidAmount(_))
        ));
    }
}
