use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use barterhub_core::{ObjectId, UserAddress};

use crate::decode::{string_field, unwrap_fields};

/// An item the user already withdrew, now held as an owned object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collectible {
    pub object_id: ObjectId,
    pub name: String,
    pub description: String,
    /// Creation time in milliseconds since the epoch, as recorded by the contract.
    pub created_at_ms: Option<u64>,
    pub original_owner: Option<UserAddress>,
}

impl Collectible {
    pub const UNNAMED: &'static str = "Unnamed";
    pub const NO_DESCRIPTION: &'static str = "No description";

    /// Lenient read: missing or unreadable fields fall back to defaults.
    pub fn from_fields(object_id: ObjectId, fields: &JsonValue) -> Self {
        let fields = unwrap_fields(fields);
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        Self {
            object_id,
            name: non_empty(string_field(fields, &["name", "nombre"])).unwrap_or_else(|| Self::UNNAMED.to_string()),
            description: non_empty(string_field(fields, &["description", "descripcion"]))
                .unwrap_or_else(|| Self::NO_DESCRIPTION.to_string()),
            created_at_ms: string_field(fields, &["created_at", "fecha_creacion"]).and_then(|s| s.parse().ok()),
            original_owner: string_field(fields, &["original_owner", "propietario_original"])
                .and_then(|s| UserAddress::parse(&s).ok()),
        }
    }
}
