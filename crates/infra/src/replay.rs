//! Rebuilding ledger state from the transaction log.
//!
//! Replay is plain re-execution: the engine deduplicates by transaction id, so
//! feeding it overlapping or duplicated history is harmless. Any other
//! execution failure means the log and the account set disagree and aborts.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use posttrade_ledger::{AccountRegistry, ExecutionOutcome, LedgerEngine, LedgerError};

use crate::state_store::{StateStore, StateStoreError};
use crate::transaction_log::{StoredEnvelope, TransactionLog, TransactionLogError};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Log(#[from] TransactionLogError),

    #[error("replay of log record {sequence_number} failed: {source}")]
    Ledger {
        sequence_number: u64,
        #[source]
        source: LedgerError,
    },

    #[error(transparent)]
    Checkpoint(#[from] StateStoreError),

    #[error("checkpoint {key} is unreadable: {reason}")]
    CorruptCheckpoint { key: String, reason: String },
}

/// Outcome of one replay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub applied: u64,
    /// Records whose transaction was already applied.
    pub skipped: u64,
    pub last_sequence: Option<u64>,
    pub last_knowledge_time: Option<DateTime<Utc>>,
}

impl ReplayReport {
    fn record(&mut self, stored: &StoredEnvelope, outcome: ExecutionOutcome) {
        match outcome {
            ExecutionOutcome::Applied => self.applied += 1,
            ExecutionOutcome::AlreadyApplied => self.skipped += 1,
        }
        self.last_sequence = Some(stored.sequence_number);
        self.last_knowledge_time = Some(
            self.last_knowledge_time
                .map_or(stored.knowledge_time(), |t| t.max(stored.knowledge_time())),
        );
    }
}

/// Execute `records` in order against `engine`.
pub fn replay_into(
    engine: &LedgerEngine,
    records: &[StoredEnvelope],
) -> Result<ReplayReport, ReplayError> {
    let mut report = ReplayReport::default();

    for stored in records {
        let outcome = engine
            .execute(stored.envelope.payload())
            .map_err(|source| {
                tracing::warn!(
                    sequence_number = stored.sequence_number,
                    transaction_id = %stored.transaction_id(),
                    error = %source,
                    "replay aborted"
                );
                ReplayError::Ledger {
                    sequence_number: stored.sequence_number,
                    source,
                }
            })?;
        report.record(stored, outcome);
    }

    tracing::info!(
        applied = report.applied,
        skipped = report.skipped,
        last_sequence = ?report.last_sequence,
        "replay finished"
    );
    Ok(report)
}

/// Fresh engine over `registry` with the full log applied.
pub fn rebuild<L>(
    registry: AccountRegistry,
    log: &L,
) -> Result<(LedgerEngine, ReplayReport), ReplayError>
where
    L: TransactionLog + ?Sized,
{
    let engine = LedgerEngine::new(registry);
    let report = replay_into(&engine, &log.replay()?)?;
    Ok((engine, report))
}

/// Fresh engine holding what was known at `as_of`.
pub fn rebuild_as_of<L>(
    registry: AccountRegistry,
    log: &L,
    as_of: DateTime<Utc>,
) -> Result<(LedgerEngine, ReplayReport), ReplayError>
where
    L: TransactionLog + ?Sized,
{
    let engine = LedgerEngine::new(registry);
    let report = replay_into(&engine, &log.replay_as_of(as_of)?)?;
    Ok((engine, report))
}

pub fn checkpoint_key(name: &str) -> String {
    format!("replay.checkpoint.{name}")
}

/// Incrementally apply what the log learned since the last checkpoint.
///
/// The checkpoint is the last knowledge time seen by the consumer `name`. It
/// belongs to one long-lived engine: catching up a fresh engine from an
/// existing checkpoint skips everything learned before it.
pub fn catch_up<L, S>(
    engine: &LedgerEngine,
    log: &L,
    checkpoints: &S,
    name: &str,
) -> Result<ReplayReport, ReplayError>
where
    L: TransactionLog + ?Sized,
    S: StateStore + ?Sized,
{
    let key = checkpoint_key(name);

    let records = match read_checkpoint(checkpoints, &key)? {
        Some(since) => log.replay_since(since)?,
        None => log.replay()?,
    };
    let report = replay_into(engine, &records)?;

    if let Some(last) = report.last_knowledge_time {
        let value = last.to_rfc3339_opts(SecondsFormat::Nanos, true);
        checkpoints.put(&key, value.into_bytes())?;
        tracing::debug!(checkpoint = %key, knowledge_time = %last, "checkpoint advanced");
    }
    Ok(report)
}

fn read_checkpoint<S>(checkpoints: &S, key: &str) -> Result<Option<DateTime<Utc>>, ReplayError>
where
    S: StateStore + ?Sized,
{
    let Some(bytes) = checkpoints.get(key)? else {
        return Ok(None);
    };
    let corrupt = |reason: String| ReplayError::CorruptCheckpoint {
        key: key.to_string(),
        reason,
    };
    let text = String::from_utf8(bytes).map_err(|e| corrupt(e.to_string()))?;
    let at = DateTime::parse_from_rfc3339(&text).map_err(|e| corrupt(e.to_string()))?;
    Ok(Some(at.with_timezone(&Utc)))
}
