//! Canonical zone identifiers.
//!
//! Zones are referred to in two ways across the system: cameras report a small
//! integer per zone, while alert configurations and events key on a UUID. Every
//! ingestion boundary converts into [`ZoneId`] so the rest of the crate only ever
//! sees the canonical form.
//!
//! Numeric ids map to `UUIDv3(NAMESPACE_OID, "zone-{n}")`. The mapping is
//! deterministic, so a zone referenced as `1` by a camera and as
//! `ZoneId::from_legacy(1)` by an alert configuration resolve to the same key.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid zone id {0:?}: expected a UUID or an integer")]
pub struct ZoneIdError(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(Uuid);

impl ZoneId {
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Maps a legacy numeric zone id into the canonical UUID namespace.
    pub fn from_legacy(number: i64) -> Self {
        let name = format!("zone-{}", number);
        Self(Uuid::new_v3(&Uuid::NAMESPACE_OID, name.as_bytes()))
    }

    /// Accepts either a canonical UUID or a decimal integer.
    pub fn parse(raw: &str) -> Result<Self, ZoneIdError> {
        let trimmed = raw.trim();
        if let Ok(id) = Uuid::parse_str(trimmed) {
            return Ok(Self(id));
        }
        trimmed
            .parse::<i64>()
            .map(Self::from_legacy)
            .map_err(|_| ZoneIdError(raw.to_string()))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for ZoneId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<ZoneId> for Uuid {
    fn from(zone: ZoneId) -> Self {
        zone.0
    }
}

impl FromStr for ZoneId {
    type Err = ZoneIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for ZoneId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ZoneId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ZoneIdVisitor;

        impl<'de> de::Visitor<'de> for ZoneIdVisitor {
            type Value = ZoneId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a zone UUID or an integer zone number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ZoneId, E> {
                ZoneId::parse(v).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ZoneId, E> {
                Ok(ZoneId::from_legacy(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ZoneId, E> {
                i64::try_from(v)
                    .map(ZoneId::from_legacy)
                    .map_err(|_| E::custom(format!("zone number {} out of range", v)))
            }
        }

        deserializer.deserialize_any(ZoneIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_mapping_is_stable() {
        assert_eq!(ZoneId::from_legacy(1), ZoneId::from_legacy(1));
        assert_ne!(ZoneId::from_legacy(1), ZoneId::from_legacy(2));
        assert_eq!(ZoneId::from_legacy(7).as_uuid().get_version_num(), 3);
    }

    #[test]
    fn parse_accepts_uuid_and_number() {
        let uuid = Uuid::new_v4();
        assert_eq!(ZoneId::parse(&uuid.to_string()).unwrap().as_uuid(), uuid);
        assert_eq!(ZoneId::parse(" 12 ").unwrap(), ZoneId::from_legacy(12));
        assert!(ZoneId::parse("zone twelve").is_err());
        assert!(ZoneId::parse("").is_err());
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        let from_int: ZoneId = serde_json::from_str("3").unwrap();
        let from_str: ZoneId = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(from_int, from_str);
        assert_eq!(from_int, ZoneId::from_legacy(3));

        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&ZoneId::from(uuid)).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
        let back: ZoneId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_uuid(), uuid);
    }
}
