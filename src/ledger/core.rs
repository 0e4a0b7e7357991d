//! Main ledger orchestrator that gates and commits prosumer operations

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::LedgerConfig;
use crate::ledger::account;
use crate::ledger::journal::JournalSummary;
use crate::ledger::view::LedgerView;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::validate_positive_amount;

/// Prosumer ledger: account table, fixed recorder and the mutating operations
///
/// Mutations take `&mut self`, so they are serialized by ownership; share a
/// ledger between tasks behind a mutex. Each mutation builds the full next
/// state and writes it with a single `LedgerStorage::commit`, so a failed call
/// leaves storage exactly as it was.
///
/// The storage is cloned into the ledger's read view. Backends must share
/// state between clones, as `MemoryStorage` does.
pub struct Ledger<S: LedgerStorage> {
    storage: S,
    view: LedgerView<S>,
}

impl<S: LedgerStorage + Clone> Ledger<S> {
    /// Create a new ledger with default policies
    pub fn new(storage: S, recorder: Address) -> Self {
        Self::with_config(storage, recorder, LedgerConfig::default())
    }

    /// Create a new ledger with explicit policies
    pub fn with_config(storage: S, recorder: Address, config: LedgerConfig) -> Self {
        Self {
            view: LedgerView::new(storage.clone(), recorder, config),
            storage,
        }
    }

    /// The identity allowed to update energy status, fixed at construction
    pub fn recorder(&self) -> &Address {
        self.view.recorder()
    }

    /// Policies in force
    pub fn config(&self) -> &LedgerConfig {
        self.view.config()
    }

    /// A read handle that can outlive borrows of the ledger
    pub fn view(&self) -> LedgerView<S> {
        self.view.clone()
    }

    // Reads
    /// Account state for an address, the zero value if unknown
    pub async fn account(&self, address: &Address) -> LedgerResult<ProsumerAccount> {
        self.view.account(address).await
    }

    /// All stored accounts
    pub async fn accounts(&self) -> LedgerResult<Vec<ProsumerAccount>> {
        self.view.accounts().await
    }

    /// Registered accounts
    pub async fn members(&self) -> LedgerResult<Vec<ProsumerAccount>> {
        self.view.members().await
    }

    /// Total value in custody
    pub async fn total_custody(&self) -> LedgerResult<u128> {
        self.view.total_custody().await
    }

    /// Journal records involving an address
    pub async fn history(&self, address: &Address) -> LedgerResult<Vec<LedgerRecord>> {
        self.view.history(address).await
    }

    // Mutations
    /// Register the caller as a prosumer
    #[instrument(skip_all, fields(caller = %caller))]
    pub async fn register_prosumer(&mut self, caller: &Address) -> LedgerResult<()> {
        let commit = self
            .plan_registration(caller)
            .await
            .inspect_err(|e| warn!(error = %e, "registration rejected"))?;

        self.storage.commit(commit).await?;
        info!("prosumer registered");
        Ok(())
    }

    /// Credit value attached by the caller to the caller's balance
    #[instrument(skip_all, fields(caller = %caller, amount = %amount))]
    pub async fn deposit(&mut self, caller: &Address, amount: u128) -> LedgerResult<()> {
        let commit = self
            .plan_deposit(caller, amount)
            .await
            .inspect_err(|e| warn!(error = %e, "deposit rejected"))?;

        let balance = commit.account.balance;
        self.storage.commit(commit).await?;
        info!(balance = %balance, "deposit credited");
        Ok(())
    }

    /// Release value from the caller's balance back to the caller
    #[instrument(skip_all, fields(caller = %caller, amount = %amount))]
    pub async fn withdraw(&mut self, caller: &Address, amount: u128) -> LedgerResult<()> {
        let commit = self
            .plan_withdrawal(caller, amount)
            .await
            .inspect_err(|e| warn!(error = %e, "withdrawal rejected"))?;

        let balance = commit.account.balance;
        self.storage.commit(commit).await?;
        info!(balance = %balance, "withdrawal released");
        Ok(())
    }

    /// Apply a signed delta to the target's energy status; recorder only
    #[instrument(skip_all, fields(caller = %caller, target = %target, delta = %delta))]
    pub async fn update_energy_status(
        &mut self,
        caller: &Address,
        target: &Address,
        delta: i128,
    ) -> LedgerResult<()> {
        let commit = self
            .plan_status_update(caller, target, delta)
            .await
            .inspect_err(|e| warn!(error = %e, "energy status update rejected"))?;

        let status = commit.account.energy_status;
        self.storage.commit(commit).await?;
        info!(energy_status = %status, "energy status updated");
        Ok(())
    }

    async fn plan_registration(&self, caller: &Address) -> LedgerResult<StateCommit> {
        let current = self.account(caller).await?;
        let now = now();
        let next = account::register(&current, now)?;

        Ok(StateCommit {
            account: next,
            total_custody: self.total_custody().await?,
            record: record(RecordKind::Registered, caller, caller, now),
        })
    }

    async fn plan_deposit(&self, caller: &Address, amount: u128) -> LedgerResult<StateCommit> {
        let config = self.config();
        if !config.allow_zero_deposit {
            validate_positive_amount(amount)?;
        }

        let current = self.account(caller).await?;
        if config.deposit_requires_membership && !current.is_member {
            return Err(LedgerError::NotRegistered(caller.clone()));
        }

        let now = now();
        let next = account::credit(&current, amount, now)?;
        let total_custody = self
            .total_custody()
            .await?
            .checked_add(amount)
            .ok_or_else(|| {
                LedgerError::ArithmeticOverflow(format!(
                    "total custody cannot absorb {}",
                    amount
                ))
            })?;

        Ok(StateCommit {
            account: next,
            total_custody,
            record: record(RecordKind::Deposited { amount }, caller, caller, now),
        })
    }

    async fn plan_withdrawal(&self, caller: &Address, amount: u128) -> LedgerResult<StateCommit> {
        validate_positive_amount(amount)?;

        let current = self.account(caller).await?;
        if !current.is_member {
            return Err(LedgerError::NotRegistered(caller.clone()));
        }

        let now = now();
        let next = account::debit(&current, amount, now)?;
        let total_custody = self
            .total_custody()
            .await?
            .checked_sub(amount)
            .ok_or_else(|| {
                LedgerError::ArithmeticUnderflow(format!(
                    "total custody is below the {} being withdrawn",
                    amount
                ))
            })?;

        Ok(StateCommit {
            account: next,
            total_custody,
            record: record(RecordKind::Withdrawn { amount }, caller, caller, now),
        })
    }

    async fn plan_status_update(
        &self,
        caller: &Address,
        target: &Address,
        delta: i128,
    ) -> LedgerResult<StateCommit> {
        if caller != self.recorder() {
            return Err(LedgerError::Unauthorized {
                caller: caller.clone(),
            });
        }

        let current = self.account(target).await?;
        if self.config().status_update_requires_membership && !current.is_member {
            return Err(LedgerError::NotRegistered(target.clone()));
        }

        let now = now();
        let next = account::adjust_energy(&current, delta, now)?;
        let kind = RecordKind::EnergyStatusUpdated {
            delta,
            new_status: next.energy_status,
        };

        Ok(StateCommit {
            account: next,
            total_custody: self.total_custody().await?,
            record: record(kind, caller, target, now),
        })
    }

    /// Validate the integrity of the ledger
    pub async fn validate_integrity(&self) -> LedgerResult<LedgerIntegrityReport> {
        let accounts = self.accounts().await?;
        let total_custody = self.total_custody().await?;
        let records = self.storage.get_records(None).await?;
        let journal = JournalSummary::replay(&records);

        let mut issues = Vec::new();

        let sum_of_balances = accounts
            .iter()
            .try_fold(0u128, |sum, account| sum.checked_add(account.balance));
        match sum_of_balances {
            Some(sum) if sum != total_custody => issues.push(format!(
                "Balances sum to {} but custody is {}",
                sum, total_custody
            )),
            Some(_) => {}
            None => issues.push("Balances overflow when summed".to_string()),
        }

        issues.extend(journal.anomalies.iter().map(|e| e.to_string()));

        let journal_custody = journal.net_custody;
        if let Some(implied) = journal_custody {
            if implied != total_custody {
                issues.push(format!(
                    "Journal implies custody {} but custody is {}",
                    implied, total_custody
                ));
            }
        }

        let members = accounts.iter().filter(|a| a.is_member).count();
        if journal.registrations != members {
            issues.push(format!(
                "Journal has {} registrations but {} accounts are members",
                journal.registrations, members
            ));
        }

        for account in &accounts {
            let replayed = journal
                .energy_by_subject
                .get(&account.address)
                .copied()
                .unwrap_or_default();
            if replayed != account.energy_status {
                issues.push(format!(
                    "Energy status of {} is {} but journal replays to {}",
                    account.address, account.energy_status, replayed
                ));
            }

            if !account.is_member
                && account.balance != 0
                && self.config().deposit_requires_membership
            {
                issues.push(format!(
                    "Unregistered account {} holds balance {}",
                    account.address, account.balance
                ));
            }
        }

        Ok(LedgerIntegrityReport {
            checked_at: now(),
            is_valid: issues.is_empty(),
            issues,
            total_custody,
            sum_of_balances,
            journal_custody,
            accounts: accounts.len(),
            members,
        })
    }
}

/// Report on ledger integrity and validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerIntegrityReport {
    pub checked_at: NaiveDateTime,
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub total_custody: u128,
    pub sum_of_balances: Option<u128>,
    pub journal_custody: Option<u128>,
    pub accounts: usize,
    pub members: usize,
}

fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

fn record(kind: RecordKind, caller: &Address, subject: &Address, at: NaiveDateTime) -> LedgerRecord {
    let mut record = LedgerRecord::new(kind, caller.clone(), subject.clone());
    record.recorded_at = at;
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;

    fn address(n: u8) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    fn ledger() -> Ledger<MemoryStorage> {
        Ledger::new(MemoryStorage::new(), address(0xee))
    }

    #[tokio::test]
    async fn test_ledger_basic_operations() {
        let mut ledger = ledger();
        let prosumer = address(1);

        ledger.register_prosumer(&prosumer).await.unwrap();
        ledger.deposit(&prosumer, 100).await.unwrap();
        ledger
            .update_energy_status(&address(0xee), &prosumer, 7)
            .await
            .unwrap();
        ledger.withdraw(&prosumer, 40).await.unwrap();

        let account = ledger.account(&prosumer).await.unwrap();
        assert!(account.is_member);
        assert_eq!(account.balance, 60);
        assert_eq!(account.energy_status, 7);
        assert_eq!(ledger.total_custody().await.unwrap(), 60);
        assert_eq!(ledger.history(&prosumer).await.unwrap().len(), 4);

        let report = ledger.validate_integrity().await.unwrap();
        assert!(report.is_valid, "{:?}", report.issues);
        assert_eq!(report.members, 1);
    }

    #[tokio::test]
    async fn test_rejected_operation_commits_nothing() {
        let mut ledger = ledger();
        let prosumer = address(1);
        ledger.register_prosumer(&prosumer).await.unwrap();
        ledger.deposit(&prosumer, u128::MAX).await.unwrap();

        let before = ledger.account(&prosumer).await.unwrap();
        let history_before = ledger.history(&prosumer).await.unwrap();

        assert!(matches!(
            ledger.deposit(&prosumer, 1).await,
            Err(LedgerError::ArithmeticOverflow(_))
        ));

        assert_eq!(ledger.account(&prosumer).await.unwrap(), before);
        assert_eq!(ledger.total_custody().await.unwrap(), u128::MAX);
        assert_eq!(ledger.history(&prosumer).await.unwrap(), history_before);
    }

    #[tokio::test]
    async fn test_custody_overflow_across_accounts() {
        let mut ledger = ledger();
        ledger.register_prosumer(&address(1)).await.unwrap();
        ledger.register_prosumer(&address(2)).await.unwrap();
        ledger.deposit(&address(1), u128::MAX).await.unwrap();

        assert!(matches!(
            ledger.deposit(&address(2), 1).await,
            Err(LedgerError::ArithmeticOverflow(_))
        ));
        assert_eq!(ledger.account(&address(2)).await.unwrap().balance, 0);
    }

    #[tokio::test]
    async fn test_integrity_reports_journal_out_of_range() {
        let storage = MemoryStorage::new();
        let mut ledger = Ledger::new(storage.clone(), address(0xee));
        ledger.register_prosumer(&address(1)).await.unwrap();
        ledger.deposit(&address(1), 5).await.unwrap();

        // A withdrawal the journal never funded.
        let mut backdoor = storage;
        backdoor
            .commit(StateCommit {
                account: ledger.account(&address(1)).await.unwrap(),
                total_custody: 5,
                record: LedgerRecord::new(
                    RecordKind::Withdrawn { amount: 6 },
                    address(1),
                    address(1),
                ),
            })
            .await
            .unwrap();

        let report = ledger.validate_integrity().await.unwrap();
        assert!(!report.is_valid);
        assert_eq!(report.journal_custody, None);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].starts_with("Arithmetic underflow"));
    }

    #[tokio::test]
    async fn test_integrity_flags_tampered_storage() {
        let storage = MemoryStorage::new();
        let mut ledger = Ledger::new(storage.clone(), address(0xee));
        ledger.register_prosumer(&address(1)).await.unwrap();
        ledger.deposit(&address(1), 10).await.unwrap();

        // Write a balance change behind the ledger's back.
        let mut tampered = ledger.account(&address(1)).await.unwrap();
        tampered.balance = 11;
        let mut backdoor = storage;
        backdoor
            .commit(StateCommit {
                account: tampered,
                total_custody: 10,
                record: LedgerRecord::new(RecordKind::Registered, address(9), address(9)),
            })
            .await
            .unwrap();

        let report = ledger.validate_integrity().await.unwrap();
        assert!(!report.is_valid);
        assert_eq!(report.sum_of_balances, Some(11));
        assert_eq!(report.issues.len(), 2);
    }
}
