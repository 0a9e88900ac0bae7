//! Event source adapter: bounded pages of registry events.
//!
//! A page is a window of at most `page_limit` entries (newest first by
//! default), not a complete history. Once the log grows past the window,
//! older store events fall out of view and items stored long ago disappear
//! from the projection until the window is widened. This is a known
//! staleness source.

use std::collections::HashMap;

use tracing::debug;

use barterhub_events::RawEvent;
use barterhub_registry::EventKind;

use crate::config::RegistryConfig;
use crate::ledger::{EventOrder, LedgerError, LedgerReader};
use crate::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct EventSourceAdapter<L> {
    ledger: L,
    event_types: HashMap<EventKind, String>,
    order: EventOrder,
    retry: RetryPolicy,
}

impl<L: LedgerReader> EventSourceAdapter<L> {
    pub fn new(ledger: L, config: &RegistryConfig) -> Self {
        let event_types = EventKind::ALL
            .iter()
            .map(|kind| (*kind, config.event_type(*kind)))
            .collect();
        Self {
            ledger,
            event_types,
            order: EventOrder::default(),
            retry: config.retry_policy(),
        }
    }

    pub fn with_order(mut self, order: EventOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn event_type(&self, kind: EventKind) -> &str {
        self.event_types.get(&kind).map(String::as_str).unwrap_or_default()
    }

    /// Fetch up to `page_limit` events of one kind.
    ///
    /// Transport and node errors are retried per the adapter's policy; the
    /// last error is returned once it is exhausted. No deduplication or
    /// reordering happens here.
    pub async fn fetch_events(&self, kind: EventKind, page_limit: usize) -> Result<Vec<RawEvent>, LedgerError> {
        let event_type = self.event_type(kind);
        let events = self
            .retry
            .run(kind.as_str(), || self.ledger.query_events(event_type, page_limit, self.order))
            .await?;
        debug!(kind = %kind, count = events.len(), page_limit, "fetched event page");
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn config() -> RegistryConfig {
        RegistryConfig {
            retry_base_delay_ms: 10,
            retry_max_delay_ms: 40,
            ..RegistryConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reads_the_configured_event_type_and_recovers_from_transient_errors() {
        let ledger = Arc::new(InMemoryLedger::new());
        let cfg = config();
        ledger.emit(&cfg.event_type(EventKind::Stored), json!({"clave": "1", "nombre_articulo": "Hat"}));
        ledger.emit(&cfg.event_type(EventKind::Withdrawn), json!({"clave": "9"}));
        ledger.fail_next(LedgerError::Transport("connection reset".into()));

        let adapter = EventSourceAdapter::new(ledger.clone(), &cfg);
        let stored = adapter.fetch_events(EventKind::Stored, 100).await.unwrap();

        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].payload()["nombre_articulo"], "Hat");
        assert_eq!(ledger.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn surfaces_terminal_transport_error() {
        let ledger = Arc::new(InMemoryLedger::new());
        for _ in 0..4 {
            ledger.fail_next(LedgerError::Transport("down".into()));
        }

        let adapter = EventSourceAdapter::new(ledger.clone(), &config());
        let err = adapter.fetch_events(EventKind::Withdrawn, 100).await.unwrap_err();

        assert_eq!(err, LedgerError::Transport("down".into()));
        assert_eq!(ledger.calls(), 4);
    }

    #[tokio::test]
    async fn page_is_a_bounded_window() {
        let ledger = Arc::new(InMemoryLedger::new());
        let cfg = config();
        for key in 1..=5 {
            ledger.emit(&cfg.event_type(EventKind::Stored), json!({"key": key}));
        }

        let adapter = EventSourceAdapter::new(ledger, &cfg).with_retry(RetryPolicy::fixed(1, Duration::ZERO));
        let page = adapter.fetch_events(EventKind::Stored, 3).await.unwrap();
        let keys: Vec<u64> = page.iter().filter_map(|e| e.payload()["key"].as_u64()).collect();
        assert_eq!(keys, vec![5, 4, 3]);
    }
}
