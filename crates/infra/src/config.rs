//! Static account configuration.
//!
//! ```json
//! {
//!   "accounts": [
//!     { "account_id": "cash.alice", "account_type": "CASH",
//!       "gl_code": "1000", "gl_account_type": "ASSET" },
//!     { "account_id": "issuance", "account_type": "ISSUANCE" }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use posttrade_accounting::{GlAccountType, GlMapping, GlMappings};
use posttrade_core::{AccountId, DomainError};
use posttrade_ledger::{Account, AccountRegistry, AccountType, LedgerError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("account {account} is configured more than once with different settings")]
    ConflictingAccount { account: AccountId },

    #[error("account {account} must set both gl_code and gl_account_type, or neither")]
    IncompleteGlMapping { account: AccountId },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub account_id: AccountId,
    pub account_type: AccountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gl_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gl_account_type: Option<GlAccountType>,
}

impl AccountConfig {
    fn gl_mapping(&self) -> Result<Option<GlMapping>, ConfigError> {
        match (&self.gl_code, self.gl_account_type) {
            (Some(code), Some(kind)) => Ok(Some(GlMapping::new(code.clone(), kind)?)),
            (None, None) => Ok(None),
            _ => Err(ConfigError::IncompleteGlMapping {
                account: self.account_id.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

impl LedgerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            accounts = config.accounts.len(),
            "ledger config loaded"
        );
        Ok(config)
    }

    /// Repeated entries must be identical; every GL pair must be complete.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen: BTreeMap<&AccountId, &AccountConfig> = BTreeMap::new();
        for entry in &self.accounts {
            entry.gl_mapping()?;
            match seen.get(&entry.account_id) {
                Some(previous) if *previous != entry => {
                    return Err(ConfigError::ConflictingAccount {
                        account: entry.account_id.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    seen.insert(&entry.account_id, entry);
                }
            }
        }
        Ok(())
    }

    pub fn registry(&self) -> Result<AccountRegistry, ConfigError> {
        let accounts = self
            .accounts
            .iter()
            .map(|a| Account::new(a.account_id.clone(), a.account_type));
        Ok(AccountRegistry::with_accounts(accounts)?)
    }

    pub fn gl_mappings(&self) -> Result<GlMappings, ConfigError> {
        let mut mappings = GlMappings::new();
        for entry in &self.accounts {
            if let Some(mapping) = entry.gl_mapping()? {
                mappings.insert(entry.account_id.clone(), mapping);
            }
        }
        Ok(mappings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "accounts": [
            { "account_id": "cash.a", "account_type": "CASH", "gl_code": "1000", "gl_account_type": "ASSET" },
            { "account_id": "cash.b", "account_type": "CASH", "gl_code": "1000", "gl_account_type": "ASSET" },
            { "account_id": "issuance", "account_type": "ISSUANCE" },
            { "account_id": "cash.a", "account_type": "CASH", "gl_code": "1000", "gl_account_type": "ASSET" }
        ]
    }"#;

    #[test]
    fn loads_registry_and_mappings() {
        let config = LedgerConfig::from_json_str(SAMPLE).unwrap();

        let registry = config.registry().unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.classification_of(&AccountId::new("issuance").unwrap()),
            Some(AccountType::Issuance)
        );

        let mappings = config.gl_mappings().unwrap();
        assert_eq!(mappings.len(), 2);
        let mapping = mappings.get(&AccountId::new("cash.b").unwrap()).unwrap();
        assert_eq!(mapping.gl_code(), "1000");
        assert_eq!(mapping.gl_account_type(), GlAccountType::Asset);
    }

    #[test]
    fn conflicting_duplicates_are_rejected() {
        let raw = r#"{ "accounts": [
            { "account_id": "x", "account_type": "CASH" },
            { "account_id": "x", "account_type": "COLLATERAL" }
        ] }"#;
        assert!(matches!(
            LedgerConfig::from_json_str(raw),
            Err(ConfigError::ConflictingAccount { .. })
        ));
    }

    #[test]
    fn half_a_gl_mapping_is_rejected() {
        let raw = r#"{ "accounts": [
            { "account_id": "x", "account_type": "CASH", "gl_code": "1000" }
        ] }"#;
        assert!(matches!(
            LedgerConfig::from_json_str(raw),
            Err(ConfigError::IncompleteGlMapping { .. })
        ));
    }

    #[test]
    fn blank_identifiers_and_unknown_types_fail_to_parse() {
        let blank = r#"{ "accounts": [ { "account_id": " ", "account_type": "CASH" } ] }"#;
        assert!(matches!(
            LedgerConfig::from_json_str(blank),
            Err(ConfigError::Parse(_))
        ));

        let unknown = r#"{ "accounts": [ { "account_id": "x", "account_type": "GOLD" } ] }"#;
        assert!(matches!(
            LedgerConfig::from_json_str(unknown),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = LedgerConfig::from_path("/nonexistent/ledger.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/ledger.json"));
    }
}
