//! Collateral posting and return.
//!
//! Posted collateral sits in a dedicated collateral account until it is
//! returned; the unit can be cash or a security.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use posttrade_core::{AccountId, ContractId, Unit};
use posttrade_ledger::Transaction;

use crate::error::BuildResult;
use crate::support::{distinct, leg, positive, transaction_id};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralTransfer {
    /// Agreement the collateral is held under.
    pub agreement_id: ContractId,
    /// Call or return reference, unique within the agreement.
    pub reference: String,
    pub time: DateTime<Utc>,
    /// Poster's cash or securities account.
    pub owner_account: AccountId,
    pub collateral_account: AccountId,
    pub unit: Unit,
    pub amount: Decimal,
}

/// Owner -> collateral account.
pub fn post(transfer: &CollateralTransfer) -> BuildResult<Transaction> {
    build("collateral-post", transfer, true)
}

/// Collateral account -> owner.
pub fn return_collateral(transfer: &CollateralTransfer) -> BuildResult<Transaction> {
    build("collateral-return", transfer, false)
}

fn build(kind: &str, transfer: &CollateralTransfer, posting: bool) -> BuildResult<Transaction> {
    let amount = positive("amount", transfer.amount)?;
    distinct(
        "collateral",
        &transfer.owner_account,
        &transfer.collateral_account,
    )?;

    let (source, destination) = if posting {
        (&transfer.owner_account, &transfer.collateral_account)
    } else {
        (&transfer.collateral_account, &transfer.owner_account)
    };

    Ok(Transaction::new(
        transaction_id(kind, &transfer.agreement_id, Some(&transfer.reference))?,
        transfer.time,
        vec![leg(
            source,
            destination,
            &transfer.unit,
            amount,
            &transfer.agreement_id,
        )],
    )?)
}
