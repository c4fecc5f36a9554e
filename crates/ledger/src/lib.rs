//! Ledger engine: instrument-agnostic double-entry bookkeeping.
//!
//! Pure domain logic only: no IO, no persistence concerns. The engine knows
//! accounts, opaque units and moves; everything an instrument means lives in
//! the code that builds transactions.

pub mod account;
pub mod engine;
pub mod error;
pub mod movement;
pub mod registry;
pub mod snapshot;
pub mod transaction;

pub use account::{Account, AccountType};
pub use engine::{ExecutionOutcome, LedgerEngine};
pub use error::{LedgerError, LedgerResult, MoveSide, MoveViolation};
pub use movement::{Move, Quantity};
pub use registry::{AccountRegistry, Registration};
pub use snapshot::{BalanceEntry, BalanceSnapshot};
pub use transaction::Transaction;
