//! Transaction builders: instrument semantics expressed as ledger moves.
//!
//! Each builder is a pure function from an instrument event (a trade, a
//! premium payment, an exercise) to a [`posttrade_ledger::Transaction`]. Ids
//! are derived from the instrument reference, so building the same event twice
//! yields the same transaction and the engine deduplicates the resubmission.

pub mod cds;
pub mod collateral;
pub mod equity;
pub mod error;
pub mod fx;
pub mod swaption;

mod support;

pub use error::{BuildError, BuildResult};
