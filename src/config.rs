//! Ledger policy configuration

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Membership and amount policies applied by the ledger
///
/// Every field has a default, so a partial JSON document (or `{}`) is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Reject deposits from identities that have not registered
    pub deposit_requires_membership: bool,
    /// Reject energy status updates that target unregistered identities
    pub status_update_requires_membership: bool,
    /// Accept deposits that attach no value
    pub allow_zero_deposit: bool,
    /// Cap on records returned by a single history query, 0 for no cap
    pub max_history_per_query: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            deposit_requires_membership: true,
            status_update_requires_membership: true,
            allow_zero_deposit: false,
            max_history_per_query: 0,
        }
    }
}

impl LedgerConfig {
    /// Load a configuration from a JSON document
    pub fn from_json_str(json: &str) -> LedgerResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| LedgerError::Validation(format!("Invalid ledger config: {}", e)))
    }

    /// Apply the history cap to a record count
    pub fn history_limit(&self, available: usize) -> usize {
        match self.max_history_per_query {
            0 => available,
            cap => available.min(cap),
        }
    }
}
