use tracing::{debug, warn};

use barterhub_core::UserAddress;
use barterhub_registry::{CreditLedger, LedgerLookup, MembershipCard};

use crate::config::{RegistryConfig, StructKind};
use crate::ledger::{LedgerError, LedgerReader};
use crate::retry::RetryPolicy;

/// Credit ledger mirror: a read-only copy of one identity's membership card.
#[derive(Debug, Clone)]
pub struct CreditLedgerMirror<L> {
    ledger: L,
    card_type: String,
    retry: RetryPolicy,
}

impl<L: LedgerReader> CreditLedgerMirror<L> {
    pub fn new(ledger: L, config: &RegistryConfig) -> Self {
        Self {
            ledger,
            card_type: config.struct_type(StructKind::MembershipCard),
            retry: config.retry_policy(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Mirror the card owned by `user`.
    ///
    /// No card is `NotRegistered`. More than one card is a contract anomaly:
    /// the first in the ledger's own order is used and a warning logged.
    pub async fn mirror(&self, user: &UserAddress) -> Result<LedgerLookup, LedgerError> {
        let cards = self
            .retry
            .run("membership", || self.ledger.owned_objects(user, &self.card_type))
            .await?;

        let Some(first) = cards.first() else {
            debug!(user = %user, "no membership card");
            return Ok(LedgerLookup::NotRegistered);
        };
        if cards.len() > 1 {
            warn!(user = %user, count = cards.len(), chosen = %first.object_id, "multiple membership cards, using the first");
        }

        let mut card = MembershipCard::from_fields(first.object_id.clone(), &first.fields)
            .map_err(|e| LedgerError::Decode(e.to_string()))?;
        if card.owner.is_none() {
            card.owner = first.owner.clone();
        }

        let ledger = CreditLedger::from(card);
        debug!(user = %user, card = %ledger.card_id(), active = ledger.active_count(), "membership mirrored");
        Ok(LedgerLookup::Registered(ledger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{InMemoryLedger, ObjectSnapshot};
    use barterhub_core::{ItemKey, ObjectId};
    use serde_json::{json, Value as JsonValue};
    use std::sync::Arc;

    fn alice() -> UserAddress {
        UserAddress::parse("0xa11ce").unwrap()
    }

    fn card(id: &str, cfg: &RegistryConfig, credits: JsonValue) -> ObjectSnapshot {
        ObjectSnapshot {
            object_id: ObjectId::parse(id).unwrap(),
            version: 1,
            type_name: Some(cfg.struct_type(StructKind::MembershipCard)),
            owner: Some(alice()),
            fields: json!({ "creditos_activos": { "fields": { "contents": credits } } }),
        }
    }

    fn entry(key: &str, value: bool) -> JsonValue {
        json!({ "fields": { "key": key, "value": value } })
    }

    #[tokio::test]
    async fn no_card_is_not_registered() {
        let cfg = RegistryConfig::default();
        let mirror = CreditLedgerMirror::new(Arc::new(InMemoryLedger::new()), &cfg);
        assert_eq!(mirror.mirror(&alice()).await.unwrap(), LedgerLookup::NotRegistered);
    }

    #[tokio::test]
    async fn reads_credit_map_and_falls_back_to_object_owner() {
        let cfg = RegistryConfig::default();
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.put_object(card("0xc1", &cfg, json!([entry("1", true), entry("2", false)])));

        let lookup = CreditLedgerMirror::new(ledger, &cfg).mirror(&alice()).await.unwrap();
        let credits = lookup.ledger().unwrap();

        assert_eq!(credits.active_keys(), vec![ItemKey::new(1)]);
        assert!(!credits.is_active(ItemKey::new(2)));
        assert_eq!(credits.owner(), Some(&alice()));
    }

    #[tokio::test]
    async fn multiple_cards_pick_the_first_in_ledger_order() {
        let cfg = RegistryConfig::default();
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.put_object(card("0xc2", &cfg, json!([entry("5", true)])));
        ledger.put_object(card("0xc1", &cfg, json!([entry("1", true)])));

        let lookup = CreditLedgerMirror::new(ledger, &cfg).mirror(&alice()).await.unwrap();
        assert_eq!(lookup.ledger().unwrap().card_id().as_str(), "0xc1");
    }

    #[tokio::test]
    async fn unreadable_card_is_a_decode_error() {
        let cfg = RegistryConfig::default();
        let ledger = Arc::new(InMemoryLedger::new());
        let mut broken = card("0xc1", &cfg, json!([]));
        broken.fields = json!({ "creditos_activos": { "contents": "oops" } });
        ledger.put_object(broken);

        let err = CreditLedgerMirror::new(ledger, &cfg).mirror(&alice()).await.unwrap_err();
        assert!(matches!(err, LedgerError::Decode(_)));
    }
}
