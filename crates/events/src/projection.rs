use crate::{Event, EventEnvelope};

/// A projection builds a read model from an append-only event stream.
///
/// Projections transform ledger events into a queryable view of "what exists
/// now". The ledger has no query for current state, so every view a client
/// shows is one of these folds.
///
/// ## Idempotency
///
/// Applying the same event twice must produce the same read model as applying
/// it once. The log may hand out overlapping pages, and a rebuild replays
/// everything it was given.
///
/// ## Disposability
///
/// Read models are **disposable**: they are never persisted and can be thrown
/// away and rebuilt from the log at any time. The ledger is the source of
/// truth; rebuilding is always correct.
pub trait Projection {
    type Ev: Event;

    /// Apply a single event to the projection, updating the read model.
    ///
    /// This method doesn't return errors. Events that cannot be interpreted are
    /// the caller's concern (they are filtered out before they become typed
    /// events).
    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>);

    /// Apply many events in the order given.
    fn apply_all<'a>(&mut self, envelopes: impl IntoIterator<Item = &'a EventEnvelope<Self::Ev>>)
    where
        Self::Ev: 'a,
    {
        for env in envelopes {
            self.apply(env);
        }
    }
}
