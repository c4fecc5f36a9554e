//! General-ledger projection over ledger balances.
//!
//! Pure and read-only: it consumes a [`posttrade_ledger::BalanceSnapshot`] and
//! never touches the engine.

pub mod mapping;
pub mod projection;

pub use mapping::{GlAccountType, GlMapping, GlMappings};
pub use projection::{GlEntry, GlError, GlReport, project};
