//! JSON-lines transaction log on the local filesystem.
//!
//! One canonical `StoredEnvelope` per line. The file is read once on open to
//! rebuild the id index; afterwards appends go to both the file and memory.
//!
//! A record is only acknowledged once its full line, newline included, is
//! synced. A failed append truncates the file back to its previous length and
//! `open` cuts off a torn final line left by a crash.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use posttrade_core::Canonical;

use super::r#trait::{
    AppendAck, LogIndex, StoredEnvelope, TransactionEnvelope, TransactionLog, TransactionLogError,
};

#[derive(Debug)]
pub struct FileTransactionLog {
    path: PathBuf,
    index: Mutex<LogIndex>,
}

impl FileTransactionLog {
    /// Open (or create) a log file and load its records.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TransactionLogError> {
        let path = path.as_ref().to_path_buf();
        let mut index = LogIndex::default();

        if path.exists() {
            let bytes = std::fs::read(&path)?;
            let complete = bytes
                .iter()
                .rposition(|b| *b == b'\n')
                .map_or(0, |last| last + 1);

            if complete < bytes.len() {
                tracing::warn!(
                    path = %path.display(),
                    torn_bytes = bytes.len() - complete,
                    "dropping torn final line from transaction log"
                );
                OpenOptions::new()
                    .write(true)
                    .open(&path)?
                    .set_len(complete as u64)?;
            }

            for (n, line) in bytes[..complete].split(|b| *b == b'\n').enumerate() {
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                let record: StoredEnvelope =
                    serde_json::from_slice(line).map_err(|e| TransactionLogError::Corrupt {
                        line: n + 1,
                        reason: e.to_string(),
                    })?;
                if index.existing(record.transaction_id()).is_some() {
                    tracing::warn!(
                        line = n + 1,
                        transaction_id = %record.transaction_id(),
                        "duplicate transaction id in log file, keeping first occurrence"
                    );
                    continue;
                }
                index.push(record);
            }
        }

        tracing::info!(path = %path.display(), "transaction log opened");
        Ok(Self {
            path,
            index: Mutex::new(index),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TransactionLog for FileTransactionLog {
    fn append(&self, envelope: TransactionEnvelope) -> Result<AppendAck, TransactionLogError> {
        let mut index = self
            .index
            .lock()
            .map_err(|_| TransactionLogError::Poisoned)?;

        if let Some(sequence_number) = index.existing(envelope.payload().id()) {
            return Ok(AppendAck::Duplicate { sequence_number });
        }

        let record = StoredEnvelope {
            sequence_number: index.next_sequence(),
            envelope,
        };
        let mut line = record
            .canonical_bytes()
            .map_err(|e| TransactionLogError::Serialization(e.to_string()))?;
        line.push(b'\n');

        // Durable step first; memory only reflects what reached the file.
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let start = file.metadata()?.len();
        if let Err(e) = write_synced(&mut file, &line) {
            match file.set_len(start) {
                Ok(()) => tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "append failed, log truncated to its last record"
                ),
                Err(truncate) => tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    truncate_error = %truncate,
                    "append failed and the partial line could not be removed"
                ),
            }
            return Err(e.into());
        }

        let sequence_number = record.sequence_number;
        index.push(record);
        Ok(AppendAck::Appended { sequence_number })
    }

    fn replay(&self) -> Result<Vec<StoredEnvelope>, TransactionLogError> {
        let index = self
            .index
            .lock()
            .map_err(|_| TransactionLogError::Poisoned)?;
        Ok(index.ordered())
    }
}

fn write_synced(file: &mut File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line)?;
    file.sync_data()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction_log::test_support::envelope;

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "posttrade-log-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("transactions.jsonl");
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn records_survive_reopen() {
        let path = temp_path("reopen");
        {
            let log = FileTransactionLog::open(&path).unwrap();
            log.append(envelope("T1", 1, 10)).unwrap();
            log.append(envelope("T2", 2, 20)).unwrap();
        }

        let reopened = FileTransactionLog::open(&path).unwrap();
        let records = reopened.replay().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].transaction_id().as_str(), "T2");

        assert_eq!(
            reopened.append(envelope("T1", 1, 30)).unwrap(),
            AppendAck::Duplicate { sequence_number: 1 }
        );
        assert_eq!(
            reopened.append(envelope("T3", 3, 30)).unwrap(),
            AppendAck::Appended { sequence_number: 3 }
        );
    }

    #[test]
    fn corrupt_lines_are_reported_with_their_position() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "{not json}\n").unwrap();

        let err = FileTransactionLog::open(&path).unwrap_err();
        assert!(matches!(err, TransactionLogError::Corrupt { line: 1, .. }));
    }

    #[test]
    fn torn_final_line_is_dropped_and_appends_resume() {
        let path = temp_path("torn");
        {
            let log = FileTransactionLog::open(&path).unwrap();
            log.append(envelope("T1", 1, 10)).unwrap();
        }
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"sequence_number":2,"envel"#).unwrap();
        drop(file);

        let log = FileTransactionLog::open(&path).unwrap();
        assert_eq!(log.replay().unwrap().len(), 1);
        assert_eq!(
            log.append(envelope("T2", 2, 20)).unwrap(),
            AppendAck::Appended { sequence_number: 2 }
        );

        let reopened = FileTransactionLog::open(&path).unwrap();
        let ids: Vec<String> = reopened
            .replay()
            .unwrap()
            .iter()
            .map(|r| r.transaction_id().to_string())
            .collect();
        assert_eq!(ids, ["T1", "T2"]);
        assert!(std::fs::read(&path).unwrap().ends_with(b"\n"));
    }
}
