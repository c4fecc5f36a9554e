use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use posttrade_core::{Canonical, ValueObject};

/// Envelope pairing a value with both of its times.
///
/// This is the unit appended to the transaction log.
///
/// Notes:
/// - `event_time` is when the value took economic effect (trade date,
///   settlement date, accrual date).
/// - `knowledge_time` is when the system learned about it. Replays "as of" a
///   knowledge time reconstruct what the system believed at that moment.
/// - The payload is immutable; corrections are new envelopes, never edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitemporalEnvelope<T> {
    event_time: DateTime<Utc>,
    knowledge_time: DateTime<Utc>,
    payload: T,
}

impl<T: ValueObject> BitemporalEnvelope<T> {
    pub fn new(event_time: DateTime<Utc>, knowledge_time: DateTime<Utc>, payload: T) -> Self {
        Self {
            event_time,
            knowledge_time,
            payload,
        }
    }

    pub fn event_time(&self) -> DateTime<Utc> {
        self.event_time
    }

    pub fn knowledge_time(&self) -> DateTime<Utc> {
        self.knowledge_time
    }

    /// Known to the system at `as_of` (inclusive).
    pub fn known_at(&self, as_of: DateTime<Utc>) -> bool {
        self.knowledge_time <= as_of
    }

    /// In economic effect at `as_of` (inclusive).
    pub fn effective_at(&self, as_of: DateTime<Utc>) -> bool {
        self.event_time <= as_of
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl<T: ValueObject> ValueObject for BitemporalEnvelope<T> {}
impl<T: ValueObject + Canonical> Canonical for BitemporalEnvelope<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Note(String);

    impl ValueObject for Note {}
    impl Canonical for Note {}

    #[test]
    fn knowledge_and_event_time_are_independent() {
        let trade_date = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let booked = Utc.with_ymd_and_hms(2024, 5, 3, 8, 0, 0).unwrap();
        let env = BitemporalEnvelope::new(trade_date, booked, Note("late booking".into()));

        let in_between = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        assert!(env.effective_at(in_between));
        assert!(!env.known_at(in_between));
        assert!(env.known_at(booked));
    }

    #[test]
    fn canonical_bytes_keep_field_order() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let env = BitemporalEnvelope::new(t, t, Note("x".into()));
        assert_eq!(
            String::from_utf8(env.canonical_bytes().unwrap()).unwrap(),
            r#"{"event_time":"2024-05-01T00:00:00Z","knowledge_time":"2024-05-01T00:00:00Z","payload":"x"}"#
        );
    }
}
