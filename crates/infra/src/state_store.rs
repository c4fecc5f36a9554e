//! Key/value storage for checkpoints and other small operational state.
//!
//! Never holds engine state: balances are always rebuilt from the log.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("state store lock poisoned")]
    Poisoned,
}

/// Byte-oriented key/value store.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StateStoreError>;

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StateStoreError>;
}

impl<S> StateStore for Arc<S>
where
    S: StateStore + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StateStoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StateStoreError> {
        (**self).put(key, value)
    }
}

/// In-memory state store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    inner: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for InMemoryStateStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StateStoreError> {
        let map = self.inner.read().map_err(|_| StateStoreError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StateStoreError> {
        let mut map = self.inner.write().map_err(|_| StateStoreError::Poisoned)?;
        map.insert(key.to_string(), value);
        Ok(())
    }
}
