//! Time-stamped envelopes and message transport (mechanics only).

pub mod bus;
pub mod envelope;
pub mod in_memory_bus;

pub use bus::{BusMessage, EventBus, PublishAck, Subscription};
pub use envelope::BitemporalEnvelope;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
