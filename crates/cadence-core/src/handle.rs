use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The registered name of an entity or event type.
///
/// Cheap to clone: every mutation request and handle carries one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(Arc<str>);

impl TypeName {
    /// Create a type name from any string.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a live entity: its type name plus its position in that type's
/// live-list. Live-lists only grow, so a handle never dangles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    /// The entity's registered type.
    #[serde(rename = "type")]
    pub type_name: TypeName,
    /// Position in the type's live-list.
    pub index: usize,
}

impl EntityRef {
    /// Create a handle for the `index`-th entity of `type_name`.
    pub fn new(type_name: impl Into<TypeName>, index: usize) -> Self {
        Self {
            type_name: type_name.into(),
            index,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_name, self.index)
    }
}

/// Handle to a materialized event, addressed the same way as [`EntityRef`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventRef {
    /// The event's registered type.
    #[serde(rename = "type")]
    pub type_name: TypeName,
    /// Position in the type's event registry.
    pub index: usize,
}

impl EventRef {
    /// Create a handle for the `index`-th event of `type_name`.
    pub fn new(type_name: impl Into<TypeName>, index: usize) -> Self {
        Self {
            type_name: type_name.into(),
            index,
        }
    }
}

impl fmt::Display for EventRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_name, self.index)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn type_name_looks_up_by_str() {
        let mut index = HashMap::new();
        index.insert(TypeName::new("Customer"), 3usize);
        assert_eq!(index.get("Customer"), Some(&3));
        assert_eq!(index.get("Sale"), None);
    }

    #[test]
    fn handles_display_type_and_position() {
        assert_eq!(EntityRef::new("Customer", 4).to_string(), "Customer#4");
        assert_eq!(EventRef::new("Sale", 0).to_string(), "Sale#0");
    }

    #[test]
    fn entity_ref_serializes_with_type_key() {
        let json = serde_json::to_value(EntityRef::new("Store", 1)).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "Store", "index": 1 }));
    }
}
