//! Core types and data structures for the prosumer ledger

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Participant identity: a `0x`-prefixed, 20-byte hex address
///
/// Addresses are normalised to lower case on parse so that two spellings of the
/// same identity always key the same account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and normalise an address
    pub fn parse(raw: &str) -> LedgerResult<Self> {
        crate::utils::validation::validate_address(raw)?;
        Ok(Self(raw.trim().to_ascii_lowercase()))
    }

    /// Borrow the normalised textual form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Prosumer account state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProsumerAccount {
    /// Identity owning the account
    pub address: Address,
    /// Set once by registration, never cleared
    pub is_member: bool,
    /// Deposited value held in custody, in base units
    pub balance: u128,
    /// Net energy position reported by the recorder
    pub energy_status: i128,
    /// When the account registered
    pub registered_at: Option<NaiveDateTime>,
    /// When the account was last mutated
    pub updated_at: Option<NaiveDateTime>,
}

impl ProsumerAccount {
    /// The zero-value account every unknown identity reads as
    pub fn empty(address: Address) -> Self {
        Self {
            address,
            is_member: false,
            balance: 0,
            energy_status: 0,
            registered_at: None,
            updated_at: None,
        }
    }

    /// Whether the account is indistinguishable from the zero value
    pub fn is_empty(&self) -> bool {
        !self.is_member && self.balance == 0 && self.energy_status == 0
    }
}

/// What a journal record describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordKind {
    /// The subject registered as a prosumer
    Registered,
    /// Value attached by the subject and credited to its balance
    Deposited { amount: u128 },
    /// Value released from custody back to the subject
    Withdrawn { amount: u128 },
    /// The recorder applied a delta to the subject's energy status
    EnergyStatusUpdated { delta: i128, new_status: i128 },
}

/// A committed ledger operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Unique identifier for the record
    pub id: Uuid,
    /// What happened
    pub kind: RecordKind,
    /// Identity that invoked the operation
    pub caller: Address,
    /// Account the operation changed
    pub subject: Address,
    /// Commit time
    pub recorded_at: NaiveDateTime,
}

impl LedgerRecord {
    /// Create a record stamped with the current time
    pub fn new(kind: RecordKind, caller: Address, subject: Address) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            caller,
            subject,
            recorded_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Whether the address took part in this record
    pub fn involves(&self, address: &Address) -> bool {
        &self.caller == address || &self.subject == address
    }
}

/// Errors that can occur in the ledger system
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Unauthorized: {caller} is not the recorder")]
    Unauthorized { caller: Address },
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),
    #[error("Arithmetic underflow: {0}")]
    ArithmeticUnderflow(String),
    #[error("Already registered: {0}")]
    AlreadyRegistered(Address),
    #[error("Not registered: {0}")]
    NotRegistered(Address),
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u128, available: u128 },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
