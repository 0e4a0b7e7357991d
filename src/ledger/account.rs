//! Per-account state transitions
//!
//! Each transition takes the current account by reference and returns the
//! complete next state, leaving the input untouched. The ledger commits the
//! returned value only when every check has passed.

use chrono::NaiveDateTime;

use crate::types::*;

/// Flip membership on; fails if the account is already a member
pub fn register(account: &ProsumerAccount, now: NaiveDateTime) -> LedgerResult<ProsumerAccount> {
    if account.is_member {
        return Err(LedgerError::AlreadyRegistered(account.address.clone()));
    }

    let mut next = account.clone();
    next.is_member = true;
    next.registered_at = Some(now);
    next.updated_at = Some(now);
    Ok(next)
}

/// Add value to the balance
pub fn credit(
    account: &ProsumerAccount,
    amount: u128,
    now: NaiveDateTime,
) -> LedgerResult<ProsumerAccount> {
    let balance = account.balance.checked_add(amount).ok_or_else(|| {
        LedgerError::ArithmeticOverflow(format!(
            "balance of {} cannot absorb {}",
            account.address, amount
        ))
    })?;

    let mut next = account.clone();
    next.balance = balance;
    next.updated_at = Some(now);
    Ok(next)
}

/// Remove value from the balance; the only path that lowers it
pub fn debit(
    account: &ProsumerAccount,
    amount: u128,
    now: NaiveDateTime,
) -> LedgerResult<ProsumerAccount> {
    let balance = account
        .balance
        .checked_sub(amount)
        .ok_or(LedgerError::InsufficientBalance {
            requested: amount,
            available: account.balance,
        })?;

    let mut next = account.clone();
    next.balance = balance;
    next.updated_at = Some(now);
    Ok(next)
}

/// Accumulate a signed delta into the energy status
pub fn adjust_energy(
    account: &ProsumerAccount,
    delta: i128,
    now: NaiveDateTime,
) -> LedgerResult<ProsumerAccount> {
    let energy_status = account.energy_status.checked_add(delta).ok_or_else(|| {
        let detail = format!(
            "energy status {} of {} cannot take delta {}",
            account.energy_status, account.address, delta
        );
        if delta > 0 {
            LedgerError::ArithmeticOverflow(detail)
        } else {
            LedgerError::ArithmeticUnderflow(detail)
        }
    })?;

    let mut next = account.clone();
    next.energy_status = energy_status;
    next.updated_at = Some(now);
    Ok(next)
}
