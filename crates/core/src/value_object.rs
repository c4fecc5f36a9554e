//! Value object trait: equality by value, not identity.

/// Marker trait for immutable values.
///
/// Value objects are compared by their attributes and never mutated after
/// construction: a `Move` of 100 USD from A to B is equal to any other such
/// move. Anything that wraps ledger history (envelopes, log records) requires
/// its payload to be a value object so that replaying it is deterministic.
///
/// Constructors of value objects validate their input, so an instance that
/// exists is always a valid one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
