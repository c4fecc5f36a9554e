use std::sync::RwLock;

use super::r#trait::{
    AppendAck, LogIndex, StoredEnvelope, TransactionEnvelope, TransactionLog, TransactionLogError,
};

/// In-memory append-only transaction log.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    index: RwLock<LogIndex>,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionLog for InMemoryTransactionLog {
    fn append(&self, envelope: TransactionEnvelope) -> Result<AppendAck, TransactionLogError> {
        let mut index = self
            .index
            .write()
            .map_err(|_| TransactionLogError::Poisoned)?;

        if let Some(sequence_number) = index.existing(envelope.payload().id()) {
            return Ok(AppendAck::Duplicate { sequence_number });
        }

        let sequence_number = index.next_sequence();
        index.push(StoredEnvelope {
            sequence_number,
            envelope,
        });
        Ok(AppendAck::Appended { sequence_number })
    }

    fn replay(&self) -> Result<Vec<StoredEnvelope>, TransactionLogError> {
        let index = self
            .index
            .read()
            .map_err(|_| TransactionLogError::Poisoned)?;
        Ok(index.ordered())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction_log::test_support::envelope;

    #[test]
    fn append_is_idempotent_per_transaction_id() {
        let log = InMemoryTransactionLog::new();
        assert_eq!(
            log.append(envelope("T1", 1, 10)).unwrap(),
            AppendAck::Appended { sequence_number: 1 }
        );
        assert_eq!(
            log.append(envelope("T1", 1, 11)).unwrap(),
            AppendAck::Duplicate { sequence_number: 1 }
        );
        assert_eq!(
            log.append(envelope("T2", 2, 12)).unwrap(),
            AppendAck::Appended { sequence_number: 2 }
        );
        assert_eq!(log.replay().unwrap().len(), 2);
    }

    #[test]
    fn replay_orders_by_knowledge_time_then_sequence() {
        let log = InMemoryTransactionLog::new();
        log.append(envelope("late", 1, 30)).unwrap();
        log.append(envelope("early", 2, 10)).unwrap();
        log.append(envelope("tie", 3, 10)).unwrap();

        let ids: Vec<String> = log
            .replay()
            .unwrap()
            .iter()
            .map(|r| r.transaction_id().to_string())
            .collect();
        assert_eq!(ids, vec!["early", "tie", "late"]);
    }

    #[test]
    fn replay_since_and_as_of_split_on_knowledge_time() {
        let log = InMemoryTransactionLog::new();
        log.append(envelope("T1", 1, 10)).unwrap();
        log.append(envelope("T2", 2, 20)).unwrap();
        log.append(envelope("T3", 3, 30)).unwrap();

        let since: Vec<String> = log
            .replay_since(crate::transaction_log::test_support::at(20))
            .unwrap()
            .iter()
            .map(|r| r.transaction_id().to_string())
            .collect();
        assert_eq!(since, vec!["T2", "T3"]);

        let as_of = log
            .replay_as_of(crate::transaction_log::test_support::at(19))
            .unwrap();
        assert_eq!(as_of.len(), 1);
        assert_eq!(as_of[0].transaction_id().as_str(), "T1");
    }
}
