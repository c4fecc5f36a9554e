//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Raised while constructing values, before anything reaches the ledger. Keep
/// this focused on deterministic failures; storage concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required identifier or code was empty (or only whitespace).
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// A quantity that must be strictly positive was zero or negative.
    #[error("{field} must be strictly positive (got {value})")]
    NonPositive { field: &'static str, value: String },

    /// A value failed to parse.
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// Canonical encoding failed.
    #[error("canonical encoding failed: {0}")]
    Encoding(String),
}

impl DomainError {
    pub fn empty(field: &'static str) -> Self {
        Self::Empty { field }
    }

    pub fn non_positive(field: &'static str, value: impl ToString) -> Self {
        Self::NonPositive {
            field,
            value: value.to_string(),
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
