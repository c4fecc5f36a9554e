use serde::{Deserialize, Serialize};

use posttrade_core::{AccountId, Canonical, ValueObject};

/// Classification of an account. Fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Cash,
    Securities,
    Derivatives,
    Collateral,
    Settlement,
    /// Source/sink of units minted and burned over a contract's life.
    Issuance,
}

impl AccountType {
    /// External code, as written in configuration and canonical encodings.
    pub fn code(self) -> &'static str {
        match self {
            AccountType::Cash => "CASH",
            AccountType::Securities => "SECURITIES",
            AccountType::Derivatives => "DERIVATIVES",
            AccountType::Collateral => "COLLATERAL",
            AccountType::Settlement => "SETTLEMENT",
            AccountType::Issuance => "ISSUANCE",
        }
    }
}

impl core::fmt::Display for AccountType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// A named, classified bucket holding per-unit balances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    account_type: AccountType,
}

impl Account {
    pub fn new(id: AccountId, account_type: AccountType) -> Self {
        Self { id, account_type }
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }
}

impl ValueObject for Account {}
impl Canonical for Account {}
