//! Content-addressed storage for reports and other canonical values.
//!
//! The id of a stored value is the SHA-256 of its canonical bytes, so storing
//! the same value twice yields the same id and never a second copy.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use posttrade_core::{Canonical, ContentHash, DomainError};

#[derive(Debug, Error)]
pub enum AttestationError {
    #[error("attested value could not be encoded: {0}")]
    Encoding(#[from] DomainError),

    #[error("attestation store lock poisoned")]
    Poisoned,
}

/// Immutable, content-addressed byte store.
pub trait AttestationStore: Send + Sync {
    /// Store canonical bytes; returns their content hash.
    fn store(&self, bytes: Vec<u8>) -> Result<ContentHash, AttestationError>;

    fn retrieve(&self, id: &ContentHash) -> Result<Option<Vec<u8>>, AttestationError>;

    fn exists(&self, id: &ContentHash) -> Result<bool, AttestationError> {
        Ok(self.retrieve(id)?.is_some())
    }
}

impl<S> AttestationStore for Arc<S>
where
    S: AttestationStore + ?Sized,
{
    fn store(&self, bytes: Vec<u8>) -> Result<ContentHash, AttestationError> {
        (**self).store(bytes)
    }

    fn retrieve(&self, id: &ContentHash) -> Result<Option<Vec<u8>>, AttestationError> {
        (**self).retrieve(id)
    }

    fn exists(&self, id: &ContentHash) -> Result<bool, AttestationError> {
        (**self).exists(id)
    }
}

/// Encode `value` canonically and store it.
pub fn attest<T, S>(store: &S, value: &T) -> Result<ContentHash, AttestationError>
where
    T: Canonical,
    S: AttestationStore + ?Sized,
{
    let id = store.store(value.canonical_bytes()?)?;
    tracing::info!(attestation_id = %id, "value attested");
    Ok(id)
}

/// In-memory attestation store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAttestationStore {
    inner: RwLock<HashMap<ContentHash, Vec<u8>>>,
}

impl InMemoryAttestationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AttestationStore for InMemoryAttestationStore {
    fn store(&self, bytes: Vec<u8>) -> Result<ContentHash, AttestationError> {
        let id = ContentHash::of(&bytes);
        let mut map = self.inner.write().map_err(|_| AttestationError::Poisoned)?;
        map.entry(id.clone()).or_insert(bytes);
        Ok(id)
    }

    fn retrieve(&self, id: &ContentHash) -> Result<Option<Vec<u8>>, AttestationError> {
        let map = self.inner.read().map_err(|_| AttestationError::Poisoned)?;
        Ok(map.get(id).cloned())
    }
}
