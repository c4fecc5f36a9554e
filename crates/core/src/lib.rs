//! `posttrade-core`: shared building blocks for the post-trade ledger.
//!
//! This crate contains **pure** primitives (no infrastructure concerns): typed
//! identifiers, the domain error model and the canonical encoding used for
//! content hashing.

pub mod canonical;
pub mod error;
pub mod id;
pub mod value_object;

pub use canonical::{Canonical, ContentHash};
pub use error::{DomainError, DomainResult};
pub use id::{AccountId, ContractId, TransactionId, Unit};
pub use value_object::ValueObject;
