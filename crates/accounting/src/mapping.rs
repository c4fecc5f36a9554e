use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use posttrade_core::{AccountId, DomainError, DomainResult};

/// General-ledger account type (determines normal balance side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GlAccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl GlAccountType {
    pub fn code(self) -> &'static str {
        match self {
            GlAccountType::Asset => "ASSET",
            GlAccountType::Liability => "LIABILITY",
            GlAccountType::Equity => "EQUITY",
            GlAccountType::Revenue => "REVENUE",
            GlAccountType::Expense => "EXPENSE",
        }
    }
}

impl core::fmt::Display for GlAccountType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// Where one ledger account lands in the general ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlMapping {
    gl_code: String, // e.g. "1000"
    gl_account_type: GlAccountType,
}

impl GlMapping {
    pub fn new(gl_code: impl Into<String>, gl_account_type: GlAccountType) -> DomainResult<Self> {
        let gl_code = gl_code.into();
        if gl_code.trim().is_empty() {
            return Err(DomainError::empty("gl_code"));
        }
        Ok(Self {
            gl_code,
            gl_account_type,
        })
    }

    pub fn gl_code(&self) -> &str {
        &self.gl_code
    }

    pub fn gl_account_type(&self) -> GlAccountType {
        self.gl_account_type
    }
}

/// Static account id -> GL mapping table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlMappings {
    by_account: BTreeMap<AccountId, GlMapping>,
}

impl GlMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the mapping for an account.
    pub fn insert(&mut self, account: AccountId, mapping: GlMapping) -> Option<GlMapping> {
        self.by_account.insert(account, mapping)
    }

    pub fn get(&self, account: &AccountId) -> Option<&GlMapping> {
        self.by_account.get(account)
    }

    pub fn len(&self) -> usize {
        self.by_account.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_account.is_empty()
    }
}

impl FromIterator<(AccountId, GlMapping)> for GlMappings {
    fn from_iter<I: IntoIterator<Item = (AccountId, GlMapping)>>(iter: I) -> Self {
        Self {
            by_account: iter.into_iter().collect(),
        }
    }
}
