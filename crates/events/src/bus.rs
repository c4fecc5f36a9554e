//! Message publishing/subscription abstraction (mechanics only).
//!
//! The bus moves opaque bytes between producers and consumers. It does not
//! interpret payloads and it is not storage: the transaction log is the source
//! of truth, the bus only distributes what was already logged.
//!
//! Delivery is **at-least-once**. Consumers must be idempotent, which ledger
//! consumers are by construction (transaction ids deduplicate).

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// One published message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    /// Partitioning/dedup key, e.g. a transaction id.
    pub key: String,
    pub payload: Vec<u8>,
}

/// Acknowledgement of a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishAck {
    /// Number of consumer groups the message was handed to.
    pub delivered_groups: usize,
}

/// A subscription to one topic on behalf of one consumer group.
///
/// Designed for single-threaded consumption.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Topic-based pub/sub with consumer groups.
///
/// - every consumer group subscribed to a topic receives each message once
/// - members of the same group share the group's messages
///
/// Publish failures are surfaced to the caller; since the log already holds
/// the data, retrying a publish is always safe.
pub trait EventBus: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<PublishAck, Self::Error>;

    fn subscribe(&self, topic: &str, group: &str) -> Result<Subscription<BusMessage>, Self::Error>;
}

impl<B> EventBus for Arc<B>
where
    B: EventBus + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<PublishAck, Self::Error> {
        (**self).publish(topic, key, payload)
    }

    fn subscribe(&self, topic: &str, group: &str) -> Result<Subscription<BusMessage>, Self::Error> {
        (**self).subscribe(topic, group)
    }
}
