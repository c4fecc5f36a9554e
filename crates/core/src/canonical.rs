//! Deterministic encoding and content hashing.
//!
//! Structurally equal values must produce identical bytes regardless of how
//! they were constructed, so that reports and log records can be diffed and
//! content-addressed. The encoding is JSON with:
//!
//! - fields in declaration order (no maps with unstable iteration order),
//! - decimals normalized (no trailing zeros, no negative zero) and written as
//!   strings,
//! - enumerations written by their declared external code.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{DomainError, DomainResult};

/// Values with a stable byte encoding.
///
/// Implementors must only contain fields whose serialization is itself
/// canonical (ordered collections, decimals via [`decimal`]).
pub trait Canonical: Serialize {
    fn canonical_bytes(&self) -> DomainResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| DomainError::Encoding(e.to_string()))
    }

    fn content_hash(&self) -> DomainResult<ContentHash> {
        Ok(ContentHash::of(&self.canonical_bytes()?))
    }
}

/// Hex-encoded SHA-256 digest of a canonical encoding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Parse a previously rendered hash (64 lowercase hex chars).
    pub fn parse(value: &str) -> DomainResult<Self> {
        let valid = value.len() == 64
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if !valid {
            return Err(DomainError::invalid(
                "content_hash",
                "expected 64 lowercase hex characters",
            ));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a decimal: strip trailing zeros and collapse negative zero.
pub fn normalize(value: Decimal) -> Decimal {
    if value.is_zero() {
        Decimal::ZERO
    } else {
        value.normalize()
    }
}

/// `#[serde(with = "posttrade_core::canonical::decimal")]` for decimal fields.
pub mod decimal {
    use core::str::FromStr;

    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::normalize(*value).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Decimal::from_str(&raw)
            .map(super::normalize)
            .map_err(serde::de::Error::custom)
    }
}
