//! # Entity Identity
//!
//! Every entity in the content tree carries an [`EntityId`]. Ids issued by
//! the backend are `Remote`; ids minted in the editor before the entity has
//! been persisted are `Local` and always start with [`LOCAL_ID_PREFIX`].
//!
//! The prefix is the wire convention: raw strings coming back through serde
//! are classified by it, so a round trip never turns a local id into a
//! remote one (or the other way around).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Prefix carried by every client-generated id
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Identity of a module, lesson, question or answer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityId {
    /// Minted by this editing session, not yet known to the backend
    Local(String),

    /// Issued by the backend
    Remote(String),
}

impl EntityId {
    /// Classify a raw id string by the local prefix convention
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.starts_with(LOCAL_ID_PREFIX) {
            EntityId::Local(raw)
        } else {
            EntityId::Remote(raw)
        }
    }

    /// Wrap a server-assigned id
    pub fn remote(raw: impl Into<String>) -> Self {
        EntityId::Remote(raw.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            EntityId::Local(s) | EntityId::Remote(s) => s,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, EntityId::Local(_))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EntityId {
    fn from(raw: &str) -> Self {
        EntityId::parse(raw)
    }
}

impl From<String> for EntityId {
    fn from(raw: String) -> Self {
        EntityId::parse(raw)
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(EntityId::parse(raw))
    }
}

/// Sequential generator for local ids within one editing session
#[derive(Debug, Clone)]
pub struct LocalIdGenerator {
    seed: String,
    count: u32,
}

impl LocalIdGenerator {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Seed derived from the current time, unique per session start
    pub fn from_clock() -> Self {
        Self::new(format!("{:x}", chrono::Utc::now().timestamp_millis()))
    }

    /// Generate next sequential id
    pub fn next_id(&mut self) -> EntityId {
        self.count += 1;
        EntityId::Local(format!("{}{}-{}", LOCAL_ID_PREFIX, self.seed, self.count))
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut gen = LocalIdGenerator::new("abc");

        let id1 = gen.next_id();
        let id2 = gen.next_id();

        assert_eq!(id1.as_str(), "local-abc-1");
        assert_eq!(id2.as_str(), "local-abc-2");
        assert!(id1.is_local());
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_parse_classifies_by_prefix() {
        assert_eq!(EntityId::parse("local-x-1"), EntityId::Local("local-x-1".into()));
        assert_eq!(EntityId::parse("42"), EntityId::Remote("42".into()));
    }

    #[test]
    fn test_serde_keeps_locality() {
        let ids = vec![EntityId::parse("local-s-3"), EntityId::remote("srv-9")];

        let json = serde_json::to_string(&ids).unwrap();
        assert_eq!(json, r#"["local-s-3","srv-9"]"#);

        let back: Vec<EntityId> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ids);
    }
}
