//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::types::*;

/// Everything one successful mutation writes
///
/// The ledger builds the complete post-operation state before handing it to
/// storage, so a backend only has to apply the three parts together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCommit {
    /// New state of the single account the operation touched
    pub account: ProsumerAccount,
    /// Total value in custody after the operation
    pub total_custody: u128,
    /// Journal entry describing the operation
    pub record: LedgerRecord,
}

/// Storage abstraction for the ledger system
///
/// This trait allows the ledger to work with any storage backend
/// (PostgreSQL, SQLite, a key-value store, in-memory, etc.) by implementing
/// these methods. `commit` must be atomic: either all of a `StateCommit`
/// becomes visible to readers or none of it does.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Get a stored account by address
    async fn get_account(&self, address: &Address) -> LedgerResult<Option<ProsumerAccount>>;

    /// List all stored accounts, ordered by address
    async fn list_accounts(&self) -> LedgerResult<Vec<ProsumerAccount>>;

    /// Total value currently in custody
    async fn total_custody(&self) -> LedgerResult<u128>;

    /// Journal records in commit order, optionally only those involving an address
    async fn get_records(&self, address: Option<&Address>) -> LedgerResult<Vec<LedgerRecord>>;

    /// Apply one mutation atomically
    async fn commit(&mut self, commit: StateCommit) -> LedgerResult<()>;
}
