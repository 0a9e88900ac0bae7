use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use barterhub_core::{ItemKey, ObjectId, UserAddress};
use barterhub_events::{Event, EventEnvelope, EventId, RawEvent};

use crate::decode::{field, string_field};

/// An item currently held by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub key: ItemKey,
    pub name: String,
    pub description: String,
    /// Object backing the stored item on the ledger, when the event names one.
    pub storage_object_ref: Option<ObjectId>,
}

/// The two event streams the registry contract emits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Stored,
    Withdrawn,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::Stored, EventKind::Withdrawn];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Stored => "stored",
            EventKind::Withdrawn => "withdrawn",
        }
    }

    /// Interpret a raw log entry as an event of this kind.
    ///
    /// The only hard requirement is a readable item key; every other field
    /// falls back to an empty value.
    pub fn decode(self, raw: &RawEvent) -> Result<EventEnvelope<RegistryEvent>, MalformedEvent> {
        let payload = raw.payload();
        if !payload.is_object() {
            return Err(MalformedEvent::new(self, raw, "payload is not an object"));
        }
        let key = decode_key(payload).map_err(|reason| MalformedEvent::new(self, raw, reason))?;

        let event = match self {
            EventKind::Stored => RegistryEvent::Stored(ItemStored {
                key,
                name: string_field(payload, &["name", "nombre_articulo", "nombre"]).unwrap_or_default(),
                description: string_field(payload, &["description", "descripcion"]).unwrap_or_default(),
                object_ref: string_field(payload, &["object_ref", "objeto_id", "object_id"])
                    .and_then(|s| ObjectId::parse(&s).ok()),
            }),
            EventKind::Withdrawn => RegistryEvent::Withdrawn(ItemWithdrawn {
                key,
                withdrawn_by: string_field(payload, &["withdrawn_by", "retirado_por"])
                    .and_then(|s| UserAddress::parse(&s).ok())
                    .or_else(|| raw.sender().cloned()),
            }),
        };

        Ok(EventEnvelope::new(
            raw.event_id().clone(),
            raw.event_type(),
            raw.sender().cloned(),
            raw.timestamp_ms(),
            event,
        ))
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn decode_key(payload: &JsonValue) -> Result<ItemKey, String> {
    let raw_key = field(payload, &["key", "clave"]).ok_or_else(|| "missing key field".to_string())?;
    serde_json::from_value(raw_key.clone()).map_err(|e| format!("unreadable key: {e}"))
}

/// Event: an item was deposited into the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStored {
    pub key: ItemKey,
    pub name: String,
    pub description: String,
    pub object_ref: Option<ObjectId>,
}

impl ItemStored {
    pub fn to_item(&self) -> Item {
        Item {
            key: self.key,
            name: self.name.clone(),
            description: self.description.clone(),
            storage_object_ref: self.object_ref.clone(),
        }
    }
}

/// Event: an item left the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemWithdrawn {
    pub key: ItemKey,
    pub withdrawn_by: Option<UserAddress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    Stored(ItemStored),
    Withdrawn(ItemWithdrawn),
}

impl RegistryEvent {
    pub fn key(&self) -> ItemKey {
        match self {
            RegistryEvent::Stored(e) => e.key,
            RegistryEvent::Withdrawn(e) => e.key,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            RegistryEvent::Stored(_) => EventKind::Stored,
            RegistryEvent::Withdrawn(_) => EventKind::Withdrawn,
        }
    }
}

impl Event for RegistryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RegistryEvent::Stored(_) => "registry.item.stored",
            RegistryEvent::Withdrawn(_) => "registry.item.withdrawn",
        }
    }

    fn version(&self) -> u32 {
        1
    }
}

/// A log entry that could not be read as a registry event.
///
/// Skipped and counted; never fatal to a projection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {kind} event {event_id}: {reason}")]
pub struct MalformedEvent {
    pub event_id: EventId,
    pub kind: EventKind,
    pub reason: String,
}

impl MalformedEvent {
    fn new(kind: EventKind, raw: &RawEvent, reason: impl Into<String>) -> Self {
        Self {
            event_id: raw.event_id().clone(),
            kind,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(seq: u64, payload: JsonValue) -> RawEvent {
        EventEnvelope::new(EventId::new("tx", seq), "pkg::mod::Ev", None, Some(1_700_000_000_000), payload)
    }

    #[test]
    fn decodes_contract_field_names() {
        let env = EventKind::Stored
            .decode(&raw(1, json!({"clave": "3", "nombre_articulo": "Hat", "descripcion": "Wool"})))
            .unwrap();
        match env.payload() {
            RegistryEvent::Stored(e) => {
                assert_eq!(e.key, ItemKey::new(3));
                assert_eq!(e.name, "Hat");
                assert_eq!(e.description, "Wool");
                assert_eq!(e.object_ref, None);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(env.event_id(), &EventId::new("tx", 1));
    }

    #[test]
    fn decodes_english_names_and_numeric_keys() {
        let env = EventKind::Stored
            .decode(&raw(1, json!({"key": 9, "name": "Scarf", "object_ref": "0xAB"})))
            .unwrap();
        let RegistryEvent::Stored(e) = env.into_payload() else {
            panic!("expected stored event");
        };
        assert_eq!(e.key, ItemKey::new(9));
        assert_eq!(e.object_ref, Some(ObjectId::parse("0xab").unwrap()));
    }

    #[test]
    fn missing_key_is_malformed() {
        let err = EventKind::Withdrawn.decode(&raw(4, json!({"name": "x"}))).unwrap_err();
        assert_eq!(err.kind, EventKind::Withdrawn);
        assert_eq!(err.event_id, EventId::new("tx", 4));
        assert!(err.reason.contains("missing key"));
    }

    #[test]
    fn unreadable_key_and_null_payload_are_malformed() {
        assert!(EventKind::Stored.decode(&raw(1, json!({"key": "abc"}))).is_err());
        assert!(EventKind::Stored.decode(&raw(2, JsonValue::Null)).is_err());
    }

    #[test]
    fn withdraw_falls_back_to_sender() {
        let sender = UserAddress::parse("0xa11ce").unwrap();
        let env = EventEnvelope::new(EventId::new("tx", 0), "t", Some(sender.clone()), None, json!({"clave": "1"}));
        let RegistryEvent::Withdrawn(e) = EventKind::Withdrawn.decode(&env).unwrap().into_payload() else {
            panic!("expected withdrawn event");
        };
        assert_eq!(e.withdrawn_by, Some(sender));
    }
}
