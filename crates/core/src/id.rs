//! Strongly-typed identifiers used across the ledger.
//!
//! All identifiers are opaque, non-empty strings. They are never centrally
//! enumerated: units in particular are minted ad hoc by whoever builds a
//! transaction (currency codes, security ids, synthetic contract tokens).

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a ledger account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

/// Name of what moves between accounts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Unit(String);

/// Unique identifier of a transaction; the idempotency key of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(String);

/// Identifier of the contract or trade a move belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContractId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create an identifier, rejecting blank input.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(DomainError::empty($name));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $t {
            type Error = DomainError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

impl_string_newtype!(AccountId, "account_id");
impl_string_newtype!(Unit, "unit");
impl_string_newtype!(TransactionId, "transaction_id");
impl_string_newtype!(ContractId, "contract_id");

impl TransactionId {
    /// Generate a fresh identifier for callers without a natural key.
    ///
    /// Uses UUIDv7 (time-ordered). Builders should prefer ids derived from the
    /// trade reference so resubmissions deduplicate.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_identifiers_are_rejected() {
        assert_eq!(AccountId::new(""), Err(DomainError::empty("account_id")));
        assert_eq!(Unit::new("   "), Err(DomainError::empty("unit")));
        assert!(TransactionId::new("T1").is_ok());
    }

    #[test]
    fn deserialization_goes_through_validation() {
        let ok: Unit = serde_json::from_str("\"USD\"").unwrap();
        assert_eq!(ok.as_str(), "USD");

        let err = serde_json::from_str::<AccountId>("\"\"");
        assert!(err.is_err());
    }

    #[test]
    fn generated_transaction_ids_are_unique() {
        assert_ne!(TransactionId::generate(), TransactionId::generate());
    }
}
