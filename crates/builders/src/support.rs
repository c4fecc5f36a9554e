use rust_decimal::Decimal;

use posttrade_core::{AccountId, ContractId, DomainError, TransactionId, Unit};
use posttrade_ledger::{Move, Quantity};

use crate::error::{BuildError, BuildResult};

/// Cash amounts settle in minor units of two decimals.
pub(crate) const CASH_DP: u32 = 2;

/// `{kind}:{contract}[:{event}]`; one instrument event always maps to one id.
pub(crate) fn transaction_id(
    kind: &str,
    contract: &ContractId,
    event: Option<&str>,
) -> BuildResult<TransactionId> {
    let id = match event.map(str::trim) {
        Some("") => return Err(DomainError::empty("event_reference").into()),
        Some(event) => format!("{kind}:{contract}:{event}"),
        None => format!("{kind}:{contract}"),
    };
    Ok(TransactionId::new(id)?)
}

pub(crate) fn positive(field: &'static str, value: Decimal) -> BuildResult<Quantity> {
    if value <= Decimal::ZERO {
        return Err(BuildError::NonPositive { field, value });
    }
    Ok(Quantity::new(value)?)
}

pub(crate) fn distinct(role: &'static str, a: &AccountId, b: &AccountId) -> BuildResult<()> {
    if a == b {
        return Err(BuildError::SameParty {
            role,
            account: a.clone(),
        });
    }
    Ok(())
}

/// `a * b`, rounded to cash precision.
pub(crate) fn cash_product(field: &'static str, a: Decimal, b: Decimal) -> BuildResult<Decimal> {
    a.checked_mul(b)
        .map(|v| v.round_dp(CASH_DP))
        .ok_or(BuildError::Overflow { field })
}

pub(crate) fn leg(
    source: &AccountId,
    destination: &AccountId,
    unit: &Unit,
    quantity: Quantity,
    contract: &ContractId,
) -> Move {
    Move::new(
        source.clone(),
        destination.clone(),
        unit.clone(),
        quantity,
        contract.clone(),
    )
}
