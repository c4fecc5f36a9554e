//! Authoritative set of known accounts.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use posttrade_core::AccountId;

use crate::account::{Account, AccountType};
use crate::error::{LedgerError, LedgerResult};

/// Result of a successful registration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Registration {
    Created,
    /// The identical account was already registered.
    Unchanged,
}

/// Registry of accounts and their classification.
///
/// Accounts are only ever added: never removed, never reclassified. Lookups
/// recover from a poisoned lock because every write is a single insert and
/// cannot leave the map half-updated.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: RwLock<BTreeMap<AccountId, AccountType>>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of accounts, failing on the first conflict.
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> LedgerResult<Self> {
        let registry = Self::new();
        for account in accounts {
            registry.register(account)?;
        }
        Ok(registry)
    }

    pub fn register(&self, account: Account) -> LedgerResult<Registration> {
        let mut accounts = self.accounts.write().map_err(|_| LedgerError::Poisoned)?;

        match accounts.get(account.id()) {
            Some(existing) if *existing == account.account_type() => Ok(Registration::Unchanged),
            Some(existing) => Err(LedgerError::ClassificationConflict {
                account: account.id().clone(),
                existing: *existing,
                requested: account.account_type(),
            }),
            None => {
                accounts.insert(account.id().clone(), account.account_type());
                Ok(Registration::Created)
            }
        }
    }

    pub fn exists(&self, id: &AccountId) -> bool {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    pub fn classification_of(&self, id: &AccountId) -> Option<AccountType> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .copied()
    }

    /// All registered accounts, ordered by id.
    pub fn accounts(&self) -> Vec<Account> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, ty)| Account::new(id.clone(), *ty))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
