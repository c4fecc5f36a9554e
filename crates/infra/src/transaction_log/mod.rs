//! Append-only transaction log boundary.
//!
//! The log is the durable history of applied transactions. Appending is a
//! separate, at-least-once step taken after the engine applied a transaction;
//! it is never part of the engine's critical section.

pub mod file;
pub mod in_memory;
pub mod r#trait;

pub use file::FileTransactionLog;
pub use in_memory::InMemoryTransactionLog;
pub use r#trait::{
    AppendAck, StoredEnvelope, TransactionEnvelope, TransactionLog, TransactionLogError,
};
