use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use barterhub_core::UserAddress;

/// Position of an event in the ledger log: the transaction that emitted it
/// plus its index inside that transaction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId {
    pub tx_digest: String,
    pub event_seq: u64,
}

impl EventId {
    pub fn new(tx_digest: impl Into<String>, event_seq: u64) -> Self {
        Self {
            tx_digest: tx_digest.into(),
            event_seq,
        }
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}#{}", self.tx_digest, self.event_seq)
    }
}

/// Envelope for an event as the ledger log hands it out.
///
/// Notes:
/// - `event_type` is the fully qualified on-chain type the log was filtered by.
/// - `timestamp_ms` is the ledger's commit time, when the node reports one.
/// - `payload` is either the raw decoded JSON ([`RawEvent`]) or a typed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: EventId,
    event_type: String,
    sender: Option<UserAddress>,
    timestamp_ms: Option<u64>,

    payload: E,
}

/// An event straight off the log, payload not yet interpreted.
pub type RawEvent = EventEnvelope<JsonValue>;

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: EventId,
        event_type: impl Into<String>,
        sender: Option<UserAddress>,
        timestamp_ms: Option<u64>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            event_type: event_type.into(),
            sender,
            timestamp_ms,
            payload,
        }
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn sender(&self) -> Option<&UserAddress> {
        self.sender.as_ref()
    }

    pub fn timestamp_ms(&self) -> Option<u64> {
        self.timestamp_ms
    }

    /// Commit time as a UTC timestamp (if reported and representable).
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        let ms = i64::try_from(self.timestamp_ms?).ok()?;
        Utc.timestamp_millis_opt(ms).single()
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }

    /// Swap the payload, keeping the log metadata.
    pub fn with_payload<T>(self, payload: T) -> EventEnvelope<T> {
        EventEnvelope {
            event_id: self.event_id,
            event_type: self.event_type,
            sender: self.sender,
            timestamp_ms: self.timestamp_ms,
            payload,
        }
    }
}
