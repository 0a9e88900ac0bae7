//! Ledger events: the envelope they arrive in and the read-model contract.

pub mod envelope;
pub mod event;
pub mod projection;

pub use envelope::{EventEnvelope, EventId, RawEvent};
pub use event::Event;
pub use projection::Projection;
