use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use barterhub_core::ItemKey;
use barterhub_events::{EventEnvelope, Projection, RawEvent};

use crate::item::{EventKind, Item, MalformedEvent, RegistryEvent};

/// Items currently in the registry: stored and not yet withdrawn.
///
/// A materialized view, rebuilt from the two event streams on every refresh
/// and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedInventory {
    items: BTreeMap<ItemKey, Item>,
}

impl ProjectedInventory {
    pub fn get(&self, key: ItemKey) -> Option<&Item> {
        self.items.get(&key)
    }

    pub fn contains(&self, key: ItemKey) -> bool {
        self.items.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items ordered by key.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = ItemKey> + '_ {
        self.items.keys().copied()
    }
}

impl FromIterator<Item> for ProjectedInventory {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(|item| (item.key, item)).collect(),
        }
    }
}

/// Fold state for the inventory view.
///
/// Stored and withdrawn keys are tracked separately and only combined in
/// [`InventoryProjection::view`], so a withdraw event observed before its
/// store event still removes the item.
#[derive(Debug, Default, Clone)]
pub struct InventoryProjection {
    stored: HashMap<ItemKey, Item>,
    withdrawn: HashSet<ItemKey>,
}

impl InventoryProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored items minus withdrawn keys.
    pub fn view(&self) -> ProjectedInventory {
        self.stored
            .values()
            .filter(|item| !self.withdrawn.contains(&item.key))
            .cloned()
            .collect()
    }
}

impl Projection for InventoryProjection {
    type Ev = RegistryEvent;

    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>) {
        match envelope.payload() {
            // Keys are assigned once; a repeated store event overwrites (last write wins).
            RegistryEvent::Stored(e) => {
                self.stored.insert(e.key, e.to_item());
            }
            RegistryEvent::Withdrawn(e) => {
                self.withdrawn.insert(e.key);
            }
        }
    }
}

/// Result of one full rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionReport {
    pub inventory: ProjectedInventory,
    /// Entries skipped because their payload could not be read.
    pub malformed: Vec<MalformedEvent>,
    pub events_applied: usize,
}

/// Rebuild the inventory view from one page of each event stream.
///
/// Side-effect free and idempotent: the output depends only on the two input
/// sequences. Entries without a readable key are skipped and reported.
pub fn project(store_events: &[RawEvent], withdraw_events: &[RawEvent]) -> ProjectionReport {
    let mut projection = InventoryProjection::new();
    let mut malformed = Vec::new();
    let mut events_applied = 0;

    let streams = [(EventKind::Stored, store_events), (EventKind::Withdrawn, withdraw_events)];
    for (kind, events) in streams {
        for raw in events {
            match kind.decode(raw) {
                Ok(env) => {
                    projection.apply(&env);
                    events_applied += 1;
                }
                Err(e) => malformed.push(e),
            }
        }
    }

    ProjectionReport {
        inventory: projection.view(),
        malformed,
        events_applied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barterhub_events::EventId;
    use proptest::prelude::*;
    use serde_json::{json, Value as JsonValue};

    fn raw(tx: &str, payload: JsonValue) -> RawEvent {
        EventEnvelope::new(EventId::new(tx, 0), "pkg::registry::Ev", None, None, payload)
    }

    fn stored(key: &str, name: &str) -> RawEvent {
        raw(&format!("s{key}"), json!({"clave": key, "nombre_articulo": name}))
    }

    fn withdrawn(key: &str) -> RawEvent {
        raw(&format!("w{key}"), json!({"clave": key}))
    }

    #[test]
    fn single_store_is_visible() {
        let report = project(&[stored("1", "Hat")], &[]);
        assert_eq!(report.inventory.len(), 1);
        let item = report.inventory.get(ItemKey::new(1)).unwrap();
        assert_eq!(item.name, "Hat");
        assert!(report.malformed.is_empty());
    }

    #[test]
    fn withdrawn_item_disappears() {
        let report = project(&[stored("1", "Hat")], &[withdrawn("1")]);
        assert!(report.inventory.is_empty());
        assert_eq!(report.events_applied, 2);
    }

    #[test]
    fn withdraw_without_store_is_harmless() {
        let report = project(&[stored("2", "Coat")], &[withdrawn("7")]);
        assert_eq!(report.inventory.keys().collect::<Vec<_>>(), vec![ItemKey::new(2)]);
    }

    #[test]
    fn duplicate_store_keeps_one_item_last_write_wins() {
        let report = project(&[stored("5", "Old"), stored("5", "New")], &[]);
        assert_eq!(report.inventory.len(), 1);
        assert_eq!(report.inventory.get(ItemKey::new(5)).unwrap().name, "New");
    }

    #[test]
    fn malformed_entries_are_skipped_and_counted() {
        let bad = raw("bad", json!({"nombre_articulo": "no key"}));
        let report = project(&[bad, stored("1", "Hat")], &[raw("bad2", JsonValue::Null)]);
        assert_eq!(report.inventory.len(), 1);
        assert_eq!(report.malformed.len(), 2);
        assert_eq!(report.malformed[0].kind, EventKind::Stored);
        assert_eq!(report.malformed[1].kind, EventKind::Withdrawn);
    }

    #[test]
    fn items_are_ordered_by_numeric_key() {
        let report = project(&[stored("10", "c"), stored("2", "b"), stored("1", "a")], &[]);
        let names: Vec<_> = report.inventory.items().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    fn key_sets() -> impl Strategy<Value = (Vec<u64>, Vec<u64>)> {
        (
            prop::collection::vec(0u64..50, 0..40),
            prop::collection::vec(0u64..50, 0..40),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a key is in the view iff it was stored and never withdrawn.
        #[test]
        fn membership_is_stored_minus_withdrawn((stores, withdraws) in key_sets()) {
            let s: Vec<_> = stores.iter().map(|k| stored(&k.to_string(), "x")).collect();
            let w: Vec<_> = withdraws.iter().map(|k| withdrawn(&k.to_string())).collect();
            let report = project(&s, &w);

            for k in 0u64..50 {
                let expected = stores.contains(&k) && !withdraws.contains(&k);
                prop_assert_eq!(report.inventory.contains(ItemKey::new(k)), expected);
            }
        }

        /// Property: rebuilding twice, or from reordered input, yields the same key set.
        #[test]
        fn projection_is_idempotent_and_order_independent((stores, withdraws) in key_sets()) {
            let s: Vec<_> = stores.iter().map(|k| stored(&k.to_string(), "x")).collect();
            let w: Vec<_> = withdraws.iter().map(|k| withdrawn(&k.to_string())).collect();

            let first = project(&s, &w);
            let second = project(&s, &w);
            prop_assert_eq!(&first, &second);

            let mut s_rev = s.clone();
            s_rev.reverse();
            let mut w_rev = w.clone();
            w_rev.reverse();
            let reordered = project(&s_rev, &w_rev);
            prop_assert_eq!(
                first.inventory.keys().collect::<Vec<_>>(),
                reordered.inventory.keys().collect::<Vec<_>>()
            );
        }

        /// Property: duplicated store events never duplicate items.
        #[test]
        fn duplicates_collapse_to_set_semantics(keys in prop::collection::vec(0u64..20, 0..30)) {
            let mut s: Vec<_> = keys.iter().map(|k| stored(&k.to_string(), "x")).collect();
            s.extend(s.clone());
            let report = project(&s, &[]);

            let mut distinct = keys.clone();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(report.inventory.len(), distinct.len());
        }
    }
}
