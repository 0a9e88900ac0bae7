//! Strongly-typed identifiers used across the domain.

use core::fmt;
use core::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::DomainError;

/// Ordinal identifier the registry assigns to a stored item.
///
/// Keys are unique and never reused within a registry instance. On the wire
/// they travel as base-10 strings (the ledger renders `u64` that way), but
/// plain JSON numbers are accepted too. Ordering is numeric.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey(u64);

impl ItemKey {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for ItemKey {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for ItemKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("ItemKey: empty"));
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|e| DomainError::invalid_id(format!("ItemKey: {trimmed:?}: {e}")))
    }
}

impl Serialize for ItemKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ItemKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = ItemKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an unsigned integer or a base-10 string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ItemKey(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map(ItemKey)
                    .map_err(|_| E::custom(format!("negative item key: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

/// Account address of a participant (the identity a wallet connects as).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserAddress(String);

/// Handle of an on-ledger object (membership card, registry, collectible, package).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

macro_rules! impl_hex_newtype {
    ($t:ident, $name:literal) => {
        impl $t {
            /// Parse and normalise (lower-case, `0x`-prefixed hex).
            pub fn parse(raw: &str) -> Result<Self, DomainError> {
                let trimmed = raw.trim();
                let hex = trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                    .ok_or_else(|| {
                        DomainError::invalid_id(format!("{}: missing 0x prefix: {trimmed:?}", $name))
                    })?;
                if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(DomainError::invalid_id(format!(
                        "{}: not a hex string: {trimmed:?}",
                        $name
                    )));
                }
                Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

impl_hex_newtype!(UserAddress, "UserAddress");
impl_hex_newtype!(ObjectId, "ObjectId");

impl ObjectId {
    /// The all-zero placeholder id (`0x0`).
    pub fn zero() -> Self {
        Self("0x0".to_string())
    }
}

/// Identifier of one consumer session (one connected identity).
///
/// A new session starts every time the connected identity changes; results
/// fetched under an older session are never merged into the current one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Uses UUIDv7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_key_accepts_string_and_number() {
        let from_str: ItemKey = serde_json::from_str("\"42\"").unwrap();
        let from_num: ItemKey = serde_json::from_str("42").unwrap();
        assert_eq!(from_str, ItemKey::new(42));
        assert_eq!(from_num, ItemKey::new(42));
    }

    #[test]
    fn item_key_serializes_as_string() {
        assert_eq!(serde_json::to_string(&ItemKey::new(7)).unwrap(), "\"7\"");
    }

    #[test]
    fn item_key_rejects_garbage() {
        assert!(serde_json::from_str::<ItemKey>("\"abc\"").is_err());
        assert!(serde_json::from_str::<ItemKey>("-3").is_err());
        assert!("".parse::<ItemKey>().is_err());
    }

    #[test]
    fn item_keys_order_numerically() {
        let mut keys: Vec<ItemKey> = ["10", "2", "1"].iter().map(|s| s.parse().unwrap()).collect();
        keys.sort();
        assert_eq!(keys, vec![ItemKey::new(1), ItemKey::new(2), ItemKey::new(10)]);
    }

    #[test]
    fn addresses_are_normalised() {
        let a = UserAddress::parse("0xABCdef").unwrap();
        assert_eq!(a.as_str(), "0xabcdef");
        assert_eq!(a, UserAddress::parse(" 0xabcdef ").unwrap());
    }

    #[test]
    fn addresses_require_hex_with_prefix() {
        assert!(UserAddress::parse("abcdef").is_err());
        assert!(UserAddress::parse("0x").is_err());
        assert!(ObjectId::parse("0xnothex").is_err());
    }
}
