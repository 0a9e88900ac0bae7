//! Helpers for reading loosely-typed ledger JSON.
//!
//! Move structs render as `{ "type": ..., "fields": { ... } }` when nested, and
//! as the bare field map at the top level of an event or object. Field names
//! are the contract's; English aliases are accepted alongside.

use serde_json::Value as JsonValue;

/// Strip one `{ "fields": ... }` wrapper if present.
pub(crate) fn unwrap_fields(value: &JsonValue) -> &JsonValue {
    match value.get("fields") {
        Some(inner) if inner.is_object() => inner,
        _ => value,
    }
}

/// First present, non-null field among `names`.
pub(crate) fn field<'a>(obj: &'a JsonValue, names: &[&str]) -> Option<&'a JsonValue> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|v| !v.is_null())
}

pub(crate) fn string_field(obj: &JsonValue, names: &[&str]) -> Option<String> {
    match field(obj, names)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
