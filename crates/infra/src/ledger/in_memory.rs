use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use barterhub_core::{ObjectId, UserAddress};
use barterhub_events::{EventEnvelope, EventId, RawEvent};

use super::r#trait::{EventOrder, LedgerError, LedgerReader, ObjectSnapshot};

#[derive(Debug, Default)]
struct LedgerState {
    events: HashMap<String, Vec<RawEvent>>,
    objects: BTreeMap<ObjectId, ObjectSnapshot>,
}

/// In-memory ledger.
///
/// Intended for tests/dev. Supports scripted failures and per-call latency so
/// callers can exercise retry and overlapping-refresh behavior. Responses are
/// read when a call starts and delivered after its latency elapses, like a
/// reply that is already on the wire.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    failures: Mutex<VecDeque<LedgerError>>,
    delays: Mutex<VecDeque<Duration>>,
    latency: Mutex<Duration>,
    next_tx: AtomicU64,
    calls: AtomicU64,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to the log of `event_type`.
    pub fn emit(&self, event_type: &str, payload: JsonValue) -> EventId {
        self.emit_from(event_type, None, payload)
    }

    pub fn emit_from(&self, event_type: &str, sender: Option<UserAddress>, payload: JsonValue) -> EventId {
        let tx = self.next_tx.fetch_add(1, Ordering::SeqCst) + 1;
        let event_id = EventId::new(format!("tx{tx}"), 0);
        let envelope = EventEnvelope::new(
            event_id.clone(),
            event_type,
            sender,
            Some(1_700_000_000_000 + tx * 1_000),
            payload,
        );
        if let Ok(mut state) = self.state.write() {
            state.events.entry(event_type.to_string()).or_default().push(envelope);
        }
        event_id
    }

    /// Create or replace an object.
    pub fn put_object(&self, snapshot: ObjectSnapshot) {
        if let Ok(mut state) = self.state.write() {
            state.objects.insert(snapshot.object_id.clone(), snapshot);
        }
    }

    pub fn remove_object(&self, id: &ObjectId) {
        if let Ok(mut state) = self.state.write() {
            state.objects.remove(id);
        }
    }

    /// Make the next call fail with `error` (queued; one failure per call).
    pub fn fail_next(&self, error: LedgerError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push_back(error);
        }
    }

    /// Delay the response of the next call (queued; one delay per call).
    pub fn delay_next(&self, delay: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push_back(delay);
        }
    }

    /// Latency applied to calls with no queued delay.
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut current) = self.latency.lock() {
            *current = latency;
        }
    }

    /// Number of read calls served (including failed ones).
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_failure(&self) -> Option<LedgerError> {
        self.failures.lock().ok()?.pop_front()
    }

    fn next_delay(&self) -> Duration {
        let queued = self.delays.lock().ok().and_then(|mut d| d.pop_front());
        queued.unwrap_or_else(|| self.latency.lock().map(|l| *l).unwrap_or_default())
    }

    fn read<T>(&self, f: impl FnOnce(&LedgerState) -> T) -> Result<T, LedgerError> {
        let state = self
            .state
            .read()
            .map_err(|_| LedgerError::Transport("lock poisoned".to_string()))?;
        Ok(f(&state))
    }

    /// Serve one call: count it, apply scripted failure, read, then wait.
    async fn serve<T>(&self, f: impl FnOnce(&LedgerState) -> T) -> Result<T, LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.next_delay();
        let outcome = match self.next_failure() {
            Some(err) => Err(err),
            None => self.read(f),
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

#[async_trait]
impl LedgerReader for InMemoryLedger {
    async fn query_events(
        &self,
        event_type: &str,
        limit: usize,
        order: EventOrder,
    ) -> Result<Vec<RawEvent>, LedgerError> {
        self.serve(|state| {
            let log = state.events.get(event_type).map(Vec::as_slice).unwrap_or_default();
            match order {
                EventOrder::Ascending => log.iter().take(limit).cloned().collect(),
                EventOrder::Descending => log.iter().rev().take(limit).cloned().collect(),
            }
        })
        .await
    }

    async fn get_object(&self, id: &ObjectId) -> Result<Option<ObjectSnapshot>, LedgerError> {
        self.serve(|state| state.objects.get(id).cloned()).await
    }

    async fn owned_objects(
        &self,
        owner: &UserAddress,
        struct_type: &str,
    ) -> Result<Vec<ObjectSnapshot>, LedgerError> {
        self.serve(|state| {
            state
                .objects
                .values()
                .filter(|o| o.owner.as_ref() == Some(owner) && o.type_name.as_deref() == Some(struct_type))
                .cloned()
                .collect()
        })
        .await
    }
}
