//! Generic value tree
//!
//! The format-agnostic intermediate representation shared by every emitter.
//! An XFA packet is folded into nested [`Value`]s by the normalizer; each
//! emitter then pattern-matches on the three variants.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Ordered key/value entries of an object
pub type ObjectMap = IndexMap<String, Value>;

/// A node of the generic value tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Attribute value or element text
    Scalar(String),
    /// Attributes, text and child groups of an element
    Object(ObjectMap),
    /// Values of two or more sibling elements sharing a tag
    List(Vec<Value>),
}

impl Value {
    /// Create a scalar value
    pub fn scalar(s: impl Into<String>) -> Self {
        Value::Scalar(s.into())
    }

    /// Get the scalar string, if this is a scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Get the object entries, if this is an object
    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Get the list items, if this is a list
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up an object entry by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Check if this is a scalar
    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Scalar(_))
    }

    /// Check if this is an object
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Check if this is a list
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s)
    }
}

impl From<ObjectMap> for Value {
    fn from(map: ObjectMap) -> Self {
        Value::Object(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Scalars serialize as strings, objects as maps in entry order, lists as
/// sequences.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Scalar(s) => serializer.serialize_str(s),
            Value::Object(map) => {
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    state.serialize_entry(key, value)?;
                }
                state.end()
            }
            Value::List(items) => {
                let mut state = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    state.serialize_element(item)?;
                }
                state.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let mut map = ObjectMap::new();
        map.insert("@name".to_string(), Value::scalar("a"));
        map.insert(
            "item".to_string(),
            Value::List(vec![Value::scalar("1"), Value::scalar("2")]),
        );
        let value = Value::Object(map);

        assert!(value.is_object());
        assert_eq!(value.get("@name").and_then(Value::as_str), Some("a"));
        assert_eq!(value.get("item").and_then(Value::as_list).map(|l| l.len()), Some(2));
        assert!(value.get("missing").is_none());
        assert!(Value::scalar("x").get("x").is_none());
    }

    #[test]
    fn test_serialize_preserves_entry_order() {
        let mut map = ObjectMap::new();
        map.insert("z".to_string(), Value::scalar("1"));
        map.insert("a".to_string(), Value::List(vec!["2".into(), "3".into()]));
        let json = serde_json::to_string(&Value::Object(map)).unwrap();
        assert_eq!(json, r#"{"z":"1","a":["2","3"]}"#);
    }
}
