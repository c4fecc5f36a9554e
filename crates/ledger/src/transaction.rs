use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use posttrade_core::{Canonical, TransactionId, ValueObject};

use crate::error::{LedgerError, LedgerResult};
use crate::movement::Move;

/// An ordered, non-empty group of moves applied atomically under one id.
///
/// Built once by a transaction builder, submitted once, applied at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TransactionRecord")]
pub struct Transaction {
    id: TransactionId,
    timestamp: DateTime<Utc>,
    moves: Vec<Move>,
}

/// Wire shape; decoding re-runs construction so an empty transaction never exists.
#[derive(Deserialize)]
struct TransactionRecord {
    id: TransactionId,
    timestamp: DateTime<Utc>,
    moves: Vec<Move>,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = LedgerError;

    fn try_from(record: TransactionRecord) -> Result<Self, Self::Error> {
        Transaction::new(record.id, record.timestamp, record.moves)
    }
}

impl Transaction {
    pub fn new(
        id: TransactionId,
        timestamp: DateTime<Utc>,
        moves: Vec<Move>,
    ) -> LedgerResult<Self> {
        if moves.is_empty() {
            return Err(LedgerError::EmptyTransaction { transaction_id: id });
        }
        Ok(Self {
            id,
            timestamp,
            moves,
        })
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }
}

impl ValueObject for Transaction {}
impl Canonical for Transaction {}
