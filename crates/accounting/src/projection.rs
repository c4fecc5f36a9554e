//! Balance snapshot -> general-ledger totals.
//!
//! For every (account, unit) balance with a GL mapping, non-negative balances
//! accumulate into the debit total of their (GL code, unit, GL type) entry and
//! negative balances (absolute value) into the credit total. Accounts without
//! a mapping are skipped. Entries come out ordered by GL code, then unit, so
//! identical state always yields byte-identical reports.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use posttrade_core::{Canonical, Unit};
use posttrade_ledger::BalanceSnapshot;

use crate::mapping::{GlAccountType, GlMappings};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GlError {
    /// Debits and credits differ across the whole report.
    #[error("trial balance failed: debits {debit_total} != credits {credit_total}")]
    Unbalanced {
        debit_total: Decimal,
        credit_total: Decimal,
    },

    /// Debits and credits differ within one unit.
    #[error("trial balance failed for {unit}: debits {debit_total} != credits {credit_total}")]
    UnbalancedUnit {
        unit: Unit,
        debit_total: Decimal,
        credit_total: Decimal,
    },

    #[error("GL totals overflow in {scope}")]
    Overflow { scope: String },
}

/// Aggregated debit/credit totals for one (GL code, unit, GL type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlEntry {
    pub gl_code: String,
    pub unit: Unit,
    pub gl_account_type: GlAccountType,
    #[serde(with = "posttrade_core::canonical::decimal")]
    pub debit_total: Decimal,
    #[serde(with = "posttrade_core::canonical::decimal")]
    pub credit_total: Decimal,
}

/// A GL projection as of a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlReport {
    as_of: DateTime<Utc>,
    entries: Vec<GlEntry>,
    #[serde(with = "posttrade_core::canonical::decimal")]
    debit_total: Decimal,
    #[serde(with = "posttrade_core::canonical::decimal")]
    credit_total: Decimal,
}

impl Canonical for GlReport {}

#[derive(Default)]
struct Totals {
    debit: Decimal,
    credit: Decimal,
}

/// Project a balance snapshot onto GL codes.
pub fn project(
    snapshot: &BalanceSnapshot,
    mappings: &GlMappings,
    as_of: DateTime<Utc>,
) -> Result<GlReport, GlError> {
    let mut grouped: BTreeMap<(String, Unit, GlAccountType), Totals> = BTreeMap::new();

    for entry in snapshot.entries() {
        let Some(mapping) = mappings.get(&entry.account) else {
            continue;
        };

        let key = (
            mapping.gl_code().to_string(),
            entry.unit.clone(),
            mapping.gl_account_type(),
        );
        let overflow = || GlError::Overflow {
            scope: format!("{} / {}", key.0, key.1),
        };
        let totals = grouped.entry(key.clone()).or_default();

        if entry.balance.is_sign_negative() && !entry.balance.is_zero() {
            totals.credit = totals
                .credit
                .checked_add(entry.balance.abs())
                .ok_or_else(overflow)?;
        } else {
            totals.debit = totals.debit.checked_add(entry.balance).ok_or_else(overflow)?;
        }
    }

    let mut debit_total = Decimal::ZERO;
    let mut credit_total = Decimal::ZERO;
    let mut entries = Vec::with_capacity(grouped.len());

    for ((gl_code, unit, gl_account_type), totals) in grouped {
        debit_total = debit_total
            .checked_add(totals.debit)
            .ok_or_else(|| GlError::Overflow {
                scope: "report debits".to_string(),
            })?;
        credit_total = credit_total
            .checked_add(totals.credit)
            .ok_or_else(|| GlError::Overflow {
                scope: "report credits".to_string(),
            })?;
        entries.push(GlEntry {
            gl_code,
            unit,
            gl_account_type,
            debit_total: totals.debit,
            credit_total: totals.credit,
        });
    }

    Ok(GlReport {
        as_of,
        entries,
        debit_total,
        credit_total,
    })
}

impl GlReport {
    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    pub fn entries(&self) -> &[GlEntry] {
        &self.entries
    }

    pub fn entry(&self, gl_code: &str, unit: &Unit) -> Option<&GlEntry> {
        self.entries
            .iter()
            .find(|e| e.gl_code == gl_code && &e.unit == unit)
    }

    pub fn debit_total(&self) -> Decimal {
        self.debit_total
    }

    pub fn credit_total(&self) -> Decimal {
        self.credit_total
    }

    /// System-wide debits minus credits. Zero when balanced; otherwise an
    /// error carrying both totals.
    pub fn trial_balance(&self) -> Result<Decimal, GlError> {
        let difference = self.debit_total - self.credit_total;
        if difference.is_zero() {
            Ok(Decimal::ZERO)
        } else {
            Err(GlError::Unbalanced {
                debit_total: self.debit_total,
                credit_total: self.credit_total,
            })
        }
    }

    /// Same check unit by unit; reports the first unbalanced unit in order.
    pub fn trial_balance_by_unit(&self) -> Result<(), GlError> {
        let mut per_unit: BTreeMap<&Unit, Totals> = BTreeMap::new();
        for entry in &self.entries {
            let overflow = || GlError::Overflow {
                scope: format!("unit {}", entry.unit),
            };
            let totals = per_unit.entry(&entry.unit).or_default();
            totals.debit = totals
                .debit
                .checked_add(entry.debit_total)
                .ok_or_else(overflow)?;
            totals.credit = totals
                .credit
                .checked_add(entry.credit_total)
                .ok_or_else(overflow)?;
        }

        for (unit, totals) in per_unit {
            if totals.debit != totals.credit {
                return Err(GlError::UnbalancedUnit {
                    unit: unit.clone(),
                    debit_total: totals.debit,
                    credit_total: totals.credit,
                });
            }
        }
        Ok(())
    }
}
