//! Infrastructure layer: transaction log, replay, processing pipeline,
//! storage capabilities and configuration.

pub mod attestation;
pub mod clock;
pub mod config;
pub mod processor;
pub mod replay;
pub mod state_store;
pub mod transaction_log;

#[cfg(test)]
mod integration_tests;

pub use attestation::{AttestationError, AttestationStore, InMemoryAttestationStore, attest};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AccountConfig, ConfigError, LedgerConfig};
pub use processor::{ProcessError, SubmitReceipt, TRANSACTIONS_TOPIC, TransactionProcessor};
pub use replay::{
    ReplayError, ReplayReport, catch_up, checkpoint_key, rebuild, rebuild_as_of, replay_into,
};
pub use state_store::{InMemoryStateStore, StateStore, StateStoreError};
pub use transaction_log::{
    AppendAck, FileTransactionLog, InMemoryTransactionLog, StoredEnvelope, TransactionEnvelope,
    TransactionLog, TransactionLogError,
};
