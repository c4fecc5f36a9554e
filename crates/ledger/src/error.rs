//! Ledger error model.
//!
//! Every failure is a returned value. Validation failures are raised before
//! any mutation, so the caller can fix the transaction and resubmit.

use rust_decimal::Decimal;
use thiserror::Error;

use posttrade_core::{AccountId, DomainError, TransactionId, Unit};

use crate::account::AccountType;

/// Result type used by the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Which end of a move an error refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MoveSide {
    Source,
    Destination,
}

impl core::fmt::Display for MoveSide {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MoveSide::Source => f.write_str("source"),
            MoveSide::Destination => f.write_str("destination"),
        }
    }
}

/// Why a single move was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveViolation {
    #[error("{side} account {account} is not registered")]
    UnknownAccount { side: MoveSide, account: AccountId },

    #[error("source and destination are both {account}")]
    SelfTransfer { account: AccountId },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A value could not be constructed (blank id, non-positive quantity).
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("transaction {transaction_id} has no moves")]
    EmptyTransaction { transaction_id: TransactionId },

    /// One move of a transaction broke a structural rule; nothing was applied.
    #[error("transaction {transaction_id}, move {index}: {violation}")]
    InvalidMove {
        transaction_id: TransactionId,
        index: usize,
        violation: MoveViolation,
    },

    /// Applying the transaction would overflow a balance; nothing was applied.
    #[error("transaction {transaction_id}: balance of {account} in {unit} would overflow")]
    Overflow {
        transaction_id: TransactionId,
        account: AccountId,
        unit: Unit,
    },

    #[error("account {account} is registered as {existing}, refusing {requested}")]
    ClassificationConflict {
        account: AccountId,
        existing: AccountType,
        requested: AccountType,
    },

    /// Reconciliation found a unit whose balances do not sum to zero.
    #[error("conservation violated for {unit}: total supply is {total}")]
    ConservationViolation { unit: Unit, total: Decimal },

    /// The signed sum of a unit cannot be represented.
    #[error("total supply of {unit} overflows")]
    SupplyOverflow { unit: Unit },

    #[error("ledger state lock poisoned")]
    Poisoned,
}

impl LedgerError {
    /// Whether the error was raised before mutation and can be fixed by resubmitting.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::Domain(_)
                | LedgerError::EmptyTransaction { .. }
                | LedgerError::InvalidMove { .. }
                | LedgerError::Overflow { .. }
                | LedgerError::ClassificationConflict { .. }
        )
    }
}
