//! Transaction processing pipeline.
//!
//! ```text
//! Transaction
//!   ↓
//! 1. Execute against the engine (validate + apply, or AlreadyApplied)
//!   ↓
//! 2. Append a bitemporal envelope to the log
//!   ↓
//! 3. Publish the logged record to the bus
//! ```
//!
//! Execution and logging are separate steps. When the append fails the
//! transaction remains applied and its envelope is parked as pending; either a
//! resubmission of the same transaction or `flush_pending()` retries it. The
//! log itself deduplicates by id, so retries never double-log.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use thiserror::Error;

use posttrade_core::{Canonical, DomainError, TransactionId};
use posttrade_events::{BitemporalEnvelope, EventBus};
use posttrade_ledger::{ExecutionOutcome, LedgerEngine, LedgerError, Transaction};

use crate::clock::Clock;
use crate::transaction_log::{
    AppendAck, StoredEnvelope, TransactionEnvelope, TransactionLog, TransactionLogError,
};

/// Topic carrying every logged transaction record.
pub const TRANSACTIONS_TOPIC: &str = "ledger.transactions";

#[derive(Debug, Error)]
pub enum ProcessError {
    /// Rejected by the engine; nothing was applied or logged.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Applied but not logged; the envelope is pending.
    #[error("transaction {transaction_id} applied but not logged: {source}")]
    Persistence {
        transaction_id: TransactionId,
        #[source]
        source: TransactionLogError,
    },

    /// Logged but not published (at-least-once; republishing is safe).
    #[error("transaction {transaction_id} logged but not published: {reason}")]
    Publish {
        transaction_id: TransactionId,
        reason: String,
    },

    #[error("log record could not be encoded: {0}")]
    Encoding(#[from] DomainError),

    #[error("pending queue lock poisoned")]
    Poisoned,
}

/// What happened to a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub outcome: ExecutionOutcome,
    /// Log position, when this call logged (or re-logged) the transaction.
    pub sequence_number: Option<u64>,
}

#[derive(Debug)]
pub struct TransactionProcessor<L, B, C> {
    engine: LedgerEngine,
    log: L,
    bus: B,
    clock: C,
    pending: Mutex<BTreeMap<TransactionId, TransactionEnvelope>>,
}

impl<L, B, C> TransactionProcessor<L, B, C> {
    pub fn new(engine: LedgerEngine, log: L, bus: B, clock: C) -> Self {
        Self {
            engine,
            log,
            bus,
            clock,
            pending: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn engine(&self) -> &LedgerEngine {
        &self.engine
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Applied transactions still waiting to be logged.
    pub fn pending(&self) -> Result<Vec<TransactionId>, ProcessError> {
        let pending = self.pending.lock().map_err(|_| ProcessError::Poisoned)?;
        Ok(pending.keys().cloned().collect())
    }
}

impl<L, B, C> TransactionProcessor<L, B, C>
where
    L: TransactionLog,
    B: EventBus,
    C: Clock,
{
    /// Execute, log and publish one transaction.
    pub fn submit(
        &self,
        transaction: &Transaction,
        event_time: DateTime<Utc>,
    ) -> Result<SubmitReceipt, ProcessError> {
        let outcome = self.engine.execute(transaction)?;

        let envelope = match outcome {
            ExecutionOutcome::Applied => {
                BitemporalEnvelope::new(event_time, self.clock.now(), transaction.clone())
            }
            ExecutionOutcome::AlreadyApplied => {
                let parked = self
                    .pending
                    .lock()
                    .map_err(|_| ProcessError::Poisoned)?
                    .remove(transaction.id());
                match parked {
                    Some(envelope) => envelope,
                    None => {
                        return Ok(SubmitReceipt {
                            outcome,
                            sequence_number: None,
                        });
                    }
                }
            }
        };

        let record = self.append_or_park(envelope)?;
        self.publish(&record)?;
        Ok(SubmitReceipt {
            outcome,
            sequence_number: Some(record.sequence_number),
        })
    }

    /// Retry the append of every pending envelope, in id order.
    ///
    /// An envelope leaves the pending set only once its append succeeds. The
    /// first failed append stops the flush and everything not yet logged stays
    /// pending. A publish failure after a successful append is logged and the
    /// flush carries on. Returns how many envelopes were logged.
    pub fn flush_pending(&self) -> Result<usize, ProcessError> {
        let parked: Vec<TransactionEnvelope> = {
            let pending = self.pending.lock().map_err(|_| ProcessError::Poisoned)?;
            pending.values().cloned().collect()
        };

        let mut flushed = 0;
        for envelope in parked {
            let record = self.append_or_park(envelope)?;
            self.pending
                .lock()
                .map_err(|_| ProcessError::Poisoned)?
                .remove(record.transaction_id());
            flushed += 1;

            if let Err(e) = self.publish(&record) {
                tracing::warn!(
                    transaction_id = %record.transaction_id(),
                    error = %e,
                    "pending transaction logged but not published"
                );
            }
        }

        if flushed > 0 {
            tracing::info!(flushed, "pending transactions logged");
        }
        Ok(flushed)
    }

    /// Append to the log. On failure the envelope is parked as pending.
    fn append_or_park(
        &self,
        envelope: TransactionEnvelope,
    ) -> Result<StoredEnvelope, ProcessError> {
        let transaction_id = envelope.payload().id().clone();

        let ack = match self.log.append(envelope.clone()) {
            Ok(ack) => ack,
            Err(source) => {
                tracing::warn!(
                    transaction_id = %transaction_id,
                    error = %source,
                    "transaction applied but not logged, parked as pending"
                );
                self.pending
                    .lock()
                    .map_err(|_| ProcessError::Poisoned)?
                    .insert(transaction_id.clone(), envelope);
                return Err(ProcessError::Persistence {
                    transaction_id,
                    source,
                });
            }
        };

        if let AppendAck::Duplicate { sequence_number } = ack {
            tracing::debug!(
                transaction_id = %transaction_id,
                sequence_number,
                "transaction already logged"
            );
        }

        Ok(StoredEnvelope {
            sequence_number: ack.sequence_number(),
            envelope,
        })
    }

    fn publish(&self, record: &StoredEnvelope) -> Result<(), ProcessError> {
        let transaction_id = record.transaction_id();
        self.bus
            .publish(
                TRANSACTIONS_TOPIC,
                transaction_id.as_str(),
                record.canonical_bytes()?,
            )
            .map_err(|e| ProcessError::Publish {
                transaction_id: transaction_id.clone(),
                reason: format!("{e:?}"),
            })?;
        Ok(())
    }
}
