//! In-memory event bus for tests/dev.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, mpsc};

use thiserror::Error;

use crate::bus::{BusMessage, EventBus, PublishAck, Subscription};

#[derive(Debug, Error)]
pub enum InMemoryBusError {
    /// Internal lock poisoning.
    #[error("event bus lock poisoned")]
    Poisoned,
}

#[derive(Debug, Default)]
struct ConsumerGroup {
    members: Vec<mpsc::Sender<BusMessage>>,
    next: usize,
}

impl ConsumerGroup {
    /// Hand the message to the next live member, dropping dead ones.
    fn deliver(&mut self, message: &BusMessage) -> bool {
        while !self.members.is_empty() {
            let idx = self.next % self.members.len();
            if self.members[idx].send(message.clone()).is_ok() {
                self.next = idx + 1;
                return true;
            }
            self.members.remove(idx);
        }
        false
    }
}

/// In-memory pub/sub bus.
///
/// - No IO / no async
/// - Groups are fanned out; members of a group are served round-robin
/// - Messages published before any subscription are dropped
#[derive(Debug, Default)]
pub struct InMemoryEventBus {
    topics: Mutex<HashMap<String, BTreeMap<String, ConsumerGroup>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventBus for InMemoryEventBus {
    type Error = InMemoryBusError;

    fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<PublishAck, Self::Error> {
        let mut topics = self.topics.lock().map_err(|_| InMemoryBusError::Poisoned)?;

        let message = BusMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            payload,
        };

        let delivered_groups = match topics.get_mut(topic) {
            Some(groups) => groups
                .values_mut()
                .filter_map(|group| group.deliver(&message).then_some(()))
                .count(),
            None => 0,
        };

        if delivered_groups == 0 {
            tracing::debug!(topic, key, "published message had no live subscribers");
        }
        Ok(PublishAck { delivered_groups })
    }

    fn subscribe(&self, topic: &str, group: &str) -> Result<Subscription<BusMessage>, Self::Error> {
        let (tx, rx) = mpsc::channel();

        let mut topics = self.topics.lock().map_err(|_| InMemoryBusError::Poisoned)?;
        topics
            .entry(topic.to_string())
            .or_default()
            .entry(group.to_string())
            .or_default()
            .members
            .push(tx);

        Ok(Subscription::new(rx))
    }
}
