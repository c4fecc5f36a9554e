use rust_decimal::Decimal;
use thiserror::Error;

use posttrade_core::{AccountId, DomainError, Unit};
use posttrade_ledger::LedgerError;

pub type BuildResult<T> = Result<T, BuildError>;

/// Instrument input that cannot be expressed as a valid transaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: Decimal },

    #[error("both sides of the {role} leg are account {account}")]
    SameParty { role: &'static str, account: AccountId },

    #[error("both legs use unit {unit}")]
    SameUnit { unit: Unit },

    #[error("{field} overflows")]
    Overflow { field: &'static str },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
