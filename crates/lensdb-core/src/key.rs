use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Key
///
/// Primary-key value as the load-state tracker sees it.
/// Numeric and text key shapes cover every entity the tracker indexes;
/// composite keys are flattened to text by the caller.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Key {
    Int(u64),
    Text(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

///
/// InstanceKey
///
/// Identity of one tracked entity instance: entity name plus primary key.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct InstanceKey {
    pub entity: String,
    pub key: Key,
}

impl InstanceKey {
    pub fn new(entity: impl Into<String>, key: impl Into<Key>) -> Self {
        Self {
            entity: entity.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.entity, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_key_display_pairs_entity_and_key() {
        let key = InstanceKey::new("customer", 42_u64);
        assert_eq!(key.to_string(), "customer[42]");

        let key = InstanceKey::new("customer", "ext-7");
        assert_eq!(key.to_string(), "customer[ext-7]");
    }
}
