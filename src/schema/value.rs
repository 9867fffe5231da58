use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Open key-value bag attached to elements, cells, connections and POIs.
///
/// Ordered by key so that equality and serialized output are deterministic.
pub type Properties = BTreeMap<String, Value>;

/// A dynamic value that can be stored in a property bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Map(Properties),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Properties> for Value {
    fn from(value: Properties) -> Self {
        Self::Map(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_are_key_ordered() {
        let mut props = Properties::new();
        props.insert("sprite".to_string(), Value::from("shrine.png"));
        props.insert("glow".to_string(), Value::from(true));
        props.insert("depth".to_string(), Value::from(3_i64));
        let keys: Vec<&str> = props.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["depth", "glow", "sprite"]);
    }

    #[test]
    fn nested_maps_compare_by_value() {
        let inner = Properties::from([("hp".to_string(), Value::Int(10))]);
        let a = Value::Map(inner.clone());
        let b = Value::Map(inner);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), None);
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::Int(4).as_int(), Some(4));
        assert_eq!(Value::Bool(false).as_bool(), Some(false));
    }
}
