//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct State {
    accounts: BTreeMap<Address, ProsumerAccount>,
    records: Vec<LedgerRecord>,
    total_custody: u128,
}

/// In-memory storage implementation for testing and development
///
/// Clones share the same underlying state, so a clone handed to a reader
/// observes every commit made through the original.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<RwLock<State>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> LedgerResult<()> {
        *self.write()? = State::default();
        Ok(())
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| LedgerError::Storage("memory storage lock poisoned".to_string()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| LedgerError::Storage("memory storage lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn get_account(&self, address: &Address) -> LedgerResult<Option<ProsumerAccount>> {
        Ok(self.read()?.accounts.get(address).cloned())
    }

    async fn list_accounts(&self) -> LedgerResult<Vec<ProsumerAccount>> {
        Ok(self.read()?.accounts.values().cloned().collect())
    }

    async fn total_custody(&self) -> LedgerResult<u128> {
        Ok(self.read()?.total_custody)
    }

    async fn get_records(&self, address: Option<&Address>) -> LedgerResult<Vec<LedgerRecord>> {
        let state = self.read()?;
        let filtered: Vec<LedgerRecord> = state
            .records
            .iter()
            .filter(|record| address.is_none_or(|a| record.involves(a)))
            .cloned()
            .collect();
        Ok(filtered)
    }

    async fn commit(&mut self, commit: StateCommit) -> LedgerResult<()> {
        let StateCommit {
            account,
            total_custody,
            record,
        } = commit;

        let mut state = self.write()?;
        state.accounts.insert(account.address.clone(), account);
        state.total_custody = total_custody;
        state.records.push(record);
        Ok(())
    }
}
