use tracing::{debug, warn};

use barterhub_registry::{project, EventKind, ProjectionReport};

use crate::event_source::EventSourceAdapter;
use crate::ledger::{LedgerError, LedgerReader};

/// Inventory projector.
///
/// Every refresh is a full rebuild from one page of each event stream; no
/// state is retained between calls.
#[derive(Debug, Clone)]
pub struct InventoryProjector<L> {
    source: EventSourceAdapter<L>,
    page_limit: usize,
}

impl<L: LedgerReader> InventoryProjector<L> {
    pub fn new(source: EventSourceAdapter<L>, page_limit: usize) -> Self {
        Self { source, page_limit }
    }

    pub fn page_limit(&self) -> usize {
        self.page_limit
    }

    /// Fetch both streams and fold them into the current inventory.
    ///
    /// Malformed entries are logged and reported, never fatal.
    pub async fn refresh(&self) -> Result<ProjectionReport, LedgerError> {
        let (stored, withdrawn) = tokio::try_join!(
            self.source.fetch_events(EventKind::Stored, self.page_limit),
            self.source.fetch_events(EventKind::Withdrawn, self.page_limit),
        )?;

        let report = project(&stored, &withdrawn);
        for skipped in &report.malformed {
            warn!(event_id = %skipped.event_id, kind = %skipped.kind, reason = %skipped.reason, "skipping malformed event");
        }
        debug!(
            items = report.inventory.len(),
            applied = report.events_applied,
            malformed = report.malformed.len(),
            "inventory projected"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::ledger::InMemoryLedger;
    use barterhub_core::ItemKey;
    use serde_json::json;
    use std::sync::Arc;

    fn projector(ledger: Arc<InMemoryLedger>, cfg: &RegistryConfig) -> InventoryProjector<Arc<InMemoryLedger>> {
        InventoryProjector::new(EventSourceAdapter::new(ledger, cfg), cfg.event_page_limit)
    }

    #[tokio::test]
    async fn withdrawn_items_leave_the_view() {
        let cfg = RegistryConfig::default();
        let ledger = Arc::new(InMemoryLedger::new());
        let stored = cfg.event_type(EventKind::Stored);
        ledger.emit(&stored, json!({"clave": "1", "nombre_articulo": "Hat"}));
        ledger.emit(&stored, json!({"clave": "2", "nombre_articulo": "Scarf"}));
        ledger.emit(&cfg.event_type(EventKind::Withdrawn), json!({"clave": "1"}));

        let report = projector(ledger, &cfg).refresh().await.unwrap();

        let keys: Vec<_> = report.inventory.keys().collect();
        assert_eq!(keys, vec![ItemKey::new(2)]);
        assert_eq!(report.inventory.get(ItemKey::new(2)).map(|i| i.name.as_str()), Some("Scarf"));
    }

    #[tokio::test]
    async fn malformed_entries_are_reported_not_fatal() {
        let cfg = RegistryConfig::default();
        let ledger = Arc::new(InMemoryLedger::new());
        let stored = cfg.event_type(EventKind::Stored);
        ledger.emit(&stored, json!({"nombre_articulo": "no key"}));
        ledger.emit(&stored, json!({"clave": "3", "nombre_articulo": "Lamp"}));

        let report = projector(ledger, &cfg).refresh().await.unwrap();

        assert_eq!(report.inventory.len(), 1);
        assert_eq!(report.malformed.len(), 1);
        assert_eq!(report.events_applied, 1);
    }

    #[tokio::test]
    async fn decode_failure_of_a_stream_fails_the_refresh() {
        let cfg = RegistryConfig::default();
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.fail_next(LedgerError::Decode("garbled page".into()));

        let err = projector(ledger, &cfg).refresh().await.unwrap_err();
        assert!(matches!(err, LedgerError::Decode(_)));
    }
}
