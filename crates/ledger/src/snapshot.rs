//! Point-in-time copy of the balance table.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use posttrade_core::{AccountId, Canonical, Unit, canonical};

/// One row of the balance table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub account: AccountId,
    pub unit: Unit,
    #[serde(with = "posttrade_core::canonical::decimal")]
    pub balance: Decimal,
}

/// Every touched (account, unit) balance, ordered by account then unit.
///
/// Two engines holding the same balances produce equal snapshots and equal
/// canonical bytes, whatever order their transactions arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    applied_transactions: u64,
    entries: Vec<BalanceEntry>,
}

impl BalanceSnapshot {
    pub(crate) fn from_table(
        applied_transactions: u64,
        table: &BTreeMap<(AccountId, Unit), Decimal>,
    ) -> Self {
        let entries = table
            .iter()
            .map(|((account, unit), balance)| BalanceEntry {
                account: account.clone(),
                unit: unit.clone(),
                balance: canonical::normalize(*balance),
            })
            .collect();
        Self {
            applied_transactions,
            entries,
        }
    }

    /// Number of transactions the engine had applied when the snapshot was taken.
    pub fn applied_transactions(&self) -> u64 {
        self.applied_transactions
    }

    pub fn entries(&self) -> &[BalanceEntry] {
        &self.entries
    }

    pub fn balance(&self, account: &AccountId, unit: &Unit) -> Decimal {
        self.entries
            .iter()
            .find(|e| &e.account == account && &e.unit == unit)
            .map(|e| e.balance)
            .unwrap_or(Decimal::ZERO)
    }

    /// Signed sum of one unit across all accounts; `None` on overflow.
    pub fn total_supply(&self, unit: &Unit) -> Option<Decimal> {
        self.entries
            .iter()
            .filter(|e| &e.unit == unit)
            .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(e.balance))
    }

    /// Balances only, ignoring how many transactions produced them.
    pub fn same_balances(&self, other: &BalanceSnapshot) -> bool {
        self.entries == other.entries
    }
}

impl Canonical for BalanceSnapshot {}
