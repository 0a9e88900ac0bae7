use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use barterhub_core::{DomainError, ItemKey, ObjectId, UserAddress};

use crate::decode::{field, string_field, unwrap_fields};

/// One entitlement on a membership card.
///
/// `active` means unconsumed: the holder may withdraw the item with this key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditEntry {
    pub key: ItemKey,
    pub active: bool,
}

/// Per-identity record holding a participant's credit entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipCard {
    pub object_id: ObjectId,
    pub owner: Option<UserAddress>,
    pub credits: Vec<CreditEntry>,
}

impl MembershipCard {
    /// Read a card from its object fields.
    ///
    /// Credits are stored on-chain as a `VecMap<u64, bool>`, which renders as
    /// `{ "fields": { "contents": [ { "fields": { "key": .., "value": .. } } ] } }`.
    /// A card without a credits field holds no credits; a card whose content
    /// is not a field map cannot be read.
    pub fn from_fields(object_id: ObjectId, fields: &JsonValue) -> Result<Self, DomainError> {
        let fields = unwrap_fields(fields);
        if !fields.is_object() {
            return Err(DomainError::validation(format!(
                "membership card {object_id}: content is not a field map"
            )));
        }

        let owner = string_field(fields, &["owner", "propietario"]).and_then(|s| UserAddress::parse(&s).ok());

        let credits = match field(fields, &["active_credits", "creditos_activos", "credits"]) {
            None => Vec::new(),
            Some(map) => read_vec_map(&object_id, map)?,
        };

        Ok(Self {
            object_id,
            owner,
            credits,
        })
    }
}

fn read_vec_map(object_id: &ObjectId, map: &JsonValue) -> Result<Vec<CreditEntry>, DomainError> {
    let contents = match unwrap_fields(map).get("contents") {
        Some(JsonValue::Array(entries)) => entries,
        Some(_) => {
            return Err(DomainError::validation(format!(
                "membership card {object_id}: credit contents is not an array"
            )));
        }
        None => return Ok(Vec::new()),
    };

    contents
        .iter()
        .map(|entry| {
            let entry = unwrap_fields(entry);
            let key = entry
                .get("key")
                .cloned()
                .ok_or_else(|| DomainError::validation(format!("membership card {object_id}: credit without key")))
                .and_then(|k| {
                    serde_json::from_value::<ItemKey>(k).map_err(|e| {
                        DomainError::validation(format!("membership card {object_id}: credit key: {e}"))
                    })
                })?;
            // Anything other than literal `true` is a consumed credit.
            let active = entry.get("value").and_then(JsonValue::as_bool).unwrap_or(false);
            Ok(CreditEntry { key, active })
        })
        .collect()
}

/// Read-only mirror of one card's `{key -> active}` map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditLedger {
    card_id: ObjectId,
    owner: Option<UserAddress>,
    entries: BTreeMap<ItemKey, bool>,
}

impl CreditLedger {
    pub fn card_id(&self) -> &ObjectId {
        &self.card_id
    }

    pub fn owner(&self) -> Option<&UserAddress> {
        self.owner.as_ref()
    }

    pub fn entries(&self) -> impl Iterator<Item = CreditEntry> + '_ {
        self.entries.iter().map(|(key, active)| CreditEntry {
            key: *key,
            active: *active,
        })
    }

    pub fn is_active(&self, key: ItemKey) -> bool {
        self.entries.get(&key).copied().unwrap_or(false)
    }

    /// Unconsumed credit keys, ascending.
    pub fn active_keys(&self) -> Vec<ItemKey> {
        self.entries
            .iter()
            .filter(|(_, active)| **active)
            .map(|(key, _)| *key)
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.entries.values().filter(|active| **active).count()
    }
}

impl From<MembershipCard> for CreditLedger {
    fn from(card: MembershipCard) -> Self {
        // At most one entry per key; a repeated key keeps the last value.
        let entries = card.credits.into_iter().map(|c| (c.key, c.active)).collect();
        Self {
            card_id: card.object_id,
            owner: card.owner,
            entries,
        }
    }
}

/// Outcome of mirroring one identity's membership.
///
/// `NotRegistered` is an expected state ("not yet joined"), not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerLookup {
    Registered(CreditLedger),
    NotRegistered,
}

impl LedgerLookup {
    pub fn ledger(&self) -> Option<&CreditLedger> {
        match self {
            LedgerLookup::Registered(ledger) => Some(ledger),
            LedgerLookup::NotRegistered => None,
        }
    }

    pub fn summary(&self) -> MembershipSummary {
        match self {
            LedgerLookup::Registered(ledger) => MembershipSummary {
                registered: true,
                card_id: Some(ledger.card_id.clone()),
                active_credits: ledger.active_count(),
            },
            LedgerLookup::NotRegistered => MembershipSummary::default(),
        }
    }
}

/// Dashboard view of a membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipSummary {
    pub registered: bool,
    pub card_id: Option<ObjectId>,
    pub active_credits: usize,
}
