use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use posttrade_core::{Canonical, TransactionId};
use posttrade_events::BitemporalEnvelope;
use posttrade_ledger::Transaction;
use std::sync::Arc;

/// Envelope of an applied transaction, as handed to the log.
pub type TransactionEnvelope = BitemporalEnvelope<Transaction>;

/// A logged envelope (assigned a sequence number).
///
/// Sequence numbers are assigned by the log on append, start at 1 and never
/// repeat. Replay orders by knowledge time first and sequence second, so an
/// envelope that was learned late is replayed where it was learned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEnvelope {
    pub sequence_number: u64,
    pub envelope: TransactionEnvelope,
}

impl StoredEnvelope {
    pub fn transaction_id(&self) -> &TransactionId {
        self.envelope.payload().id()
    }

    pub fn knowledge_time(&self) -> DateTime<Utc> {
        self.envelope.knowledge_time()
    }

    fn replay_key(&self) -> (DateTime<Utc>, u64) {
        (self.envelope.knowledge_time(), self.sequence_number)
    }
}

impl Canonical for StoredEnvelope {}

/// Result of an append.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AppendAck {
    Appended { sequence_number: u64 },
    /// The transaction id was already logged; nothing was written.
    Duplicate { sequence_number: u64 },
}

impl AppendAck {
    pub fn sequence_number(self) -> u64 {
        match self {
            AppendAck::Appended { sequence_number } | AppendAck::Duplicate { sequence_number } => {
                sequence_number
            }
        }
    }
}

/// Transaction log operation error.
///
/// These are **persistence failures**: the engine's in-memory state stays
/// authoritative, and the append can be retried.
#[derive(Debug, Error)]
pub enum TransactionLogError {
    #[error("log io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("log record {line} is corrupt: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("log record serialization failed: {0}")]
    Serialization(String),

    #[error("transaction log lock poisoned")]
    Poisoned,
}

/// Append-only, time-ordered history of applied transactions.
///
/// ## Append Semantics
///
/// `append()` is idempotent per transaction id: re-appending an id already
/// in the log is acknowledged as `Duplicate` without writing. This makes the
/// at-least-once persistence step after `execute()` safe to retry.
///
/// ## Replay Semantics
///
/// - `replay()` returns the whole history ordered by (knowledge time, sequence).
/// - `replay_since(t)` returns the envelopes with knowledge time at or after
///   `t`, same order. Inclusive so that a consumer checkpointing its last seen
///   knowledge time never misses a record learned at that same instant; the
///   ledger deduplicates the overlap.
/// - `replay_as_of(t)` returns what the system knew at `t`.
pub trait TransactionLog: Send + Sync {
    fn append(&self, envelope: TransactionEnvelope) -> Result<AppendAck, TransactionLogError>;

    fn replay(&self) -> Result<Vec<StoredEnvelope>, TransactionLogError>;

    fn replay_since(
        &self,
        knowledge_time: DateTime<Utc>,
    ) -> Result<Vec<StoredEnvelope>, TransactionLogError> {
        Ok(self
            .replay()?
            .into_iter()
            .filter(|e| e.knowledge_time() >= knowledge_time)
            .collect())
    }

    fn replay_as_of(
        &self,
        knowledge_time: DateTime<Utc>,
    ) -> Result<Vec<StoredEnvelope>, TransactionLogError> {
        Ok(self
            .replay()?
            .into_iter()
            .filter(|e| e.envelope.known_at(knowledge_time))
            .collect())
    }
}

impl<S> TransactionLog for Arc<S>
where
    S: TransactionLog + ?Sized,
{
    fn append(&self, envelope: TransactionEnvelope) -> Result<AppendAck, TransactionLogError> {
        (**self).append(envelope)
    }

    fn replay(&self) -> Result<Vec<StoredEnvelope>, TransactionLogError> {
        (**self).replay()
    }

    fn replay_since(
        &self,
        knowledge_time: DateTime<Utc>,
    ) -> Result<Vec<StoredEnvelope>, TransactionLogError> {
        (**self).replay_since(knowledge_time)
    }

    fn replay_as_of(
        &self,
        knowledge_time: DateTime<Utc>,
    ) -> Result<Vec<StoredEnvelope>, TransactionLogError> {
        (**self).replay_as_of(knowledge_time)
    }
}

/// Shared bookkeeping for log implementations: records plus an id index.
#[derive(Debug, Default)]
pub(crate) struct LogIndex {
    records: Vec<StoredEnvelope>,
    by_id: std::collections::HashMap<TransactionId, u64>,
}

impl LogIndex {
    pub(crate) fn existing(&self, id: &TransactionId) -> Option<u64> {
        self.by_id.get(id).copied()
    }

    pub(crate) fn next_sequence(&self) -> u64 {
        self.records.last().map(|r| r.sequence_number).unwrap_or(0) + 1
    }

    pub(crate) fn push(&mut self, record: StoredEnvelope) {
        self.by_id
            .insert(record.transaction_id().clone(), record.sequence_number);
        self.records.push(record);
    }

    pub(crate) fn ordered(&self) -> Vec<StoredEnvelope> {
        let mut out = self.records.clone();
        out.sort_by_key(StoredEnvelope::replay_key);
        out
    }
}
