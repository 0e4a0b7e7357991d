//! Read-only projection of the ledger

use crate::config::LedgerConfig;
use crate::ledger::journal::most_recent;
use crate::traits::*;
use crate::types::*;

/// Cloneable read handle over a ledger's storage
///
/// A view never mutates, so it can be handed to other tasks while the owning
/// `Ledger` keeps accepting operations. Every read reflects the most recent
/// completed commit.
#[derive(Debug, Clone)]
pub struct LedgerView<S: LedgerStorage> {
    pub(crate) storage: S,
    recorder: Address,
    config: LedgerConfig,
}

impl<S: LedgerStorage> LedgerView<S> {
    pub(crate) fn new(storage: S, recorder: Address, config: LedgerConfig) -> Self {
        Self {
            storage,
            recorder,
            config,
        }
    }

    /// The identity allowed to update energy status
    pub fn recorder(&self) -> &Address {
        &self.recorder
    }

    /// Policies the ledger was built with
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Account state for an address, the zero value if never touched
    pub async fn account(&self, address: &Address) -> LedgerResult<ProsumerAccount> {
        Ok(self
            .storage
            .get_account(address)
            .await?
            .unwrap_or_else(|| ProsumerAccount::empty(address.clone())))
    }

    /// Every stored account, ordered by address
    pub async fn accounts(&self) -> LedgerResult<Vec<ProsumerAccount>> {
        self.storage.list_accounts().await
    }

    /// Registered accounts only
    pub async fn members(&self) -> LedgerResult<Vec<ProsumerAccount>> {
        Ok(self
            .storage
            .list_accounts()
            .await?
            .into_iter()
            .filter(|account| account.is_member)
            .collect())
    }

    /// Whether the address has registered
    pub async fn is_member(&self, address: &Address) -> LedgerResult<bool> {
        Ok(self.account(address).await?.is_member)
    }

    /// Total value held in custody across all balances
    pub async fn total_custody(&self) -> LedgerResult<u128> {
        self.storage.total_custody().await
    }

    /// Records the address took part in, oldest first, capped by config
    pub async fn history(&self, address: &Address) -> LedgerResult<Vec<LedgerRecord>> {
        let records = self.storage.get_records(Some(address)).await?;
        let limit = self.config.history_limit(records.len());
        Ok(most_recent(records, limit))
    }
}
