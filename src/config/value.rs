//! Property values and classification of decoded entries.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// The generic decoded object every decoder produces.
pub type RawObject = serde_json::Map<String, Value>;

/// The kind of a property, fixed by its base-tier value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Float,
    String,
    Integer,
    List,
    /// A child namespace. Never the kind of a stored value.
    Object,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::List => "list",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property value at one tier.
///
/// List elements are kept as decoded, so lists may be heterogeneous and may
/// contain nested objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Float(f64),
    String(String),
    Integer(i64),
    List(Vec<Value>),
}

impl ConfigValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Bool(_) => ValueKind::Bool,
            ConfigValue::Float(_) => ValueKind::Float,
            ConfigValue::String(_) => ValueKind::String,
            ConfigValue::Integer(_) => ValueKind::Integer,
            ConfigValue::List(_) => ValueKind::List,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, and integers read as floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Converts `self` into a value of `kind`, if the kinds are compatible.
    ///
    /// Integers widen into floats; every other pairing must match exactly.
    pub fn coerce_to(self, kind: ValueKind) -> Result<ConfigValue, ConfigValue> {
        match (self, kind) {
            (ConfigValue::Integer(i), ValueKind::Float) => Ok(ConfigValue::Float(i as f64)),
            (value, kind) if value.kind() == kind => Ok(value),
            (value, _) => Err(value),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ConfigValue::Bool(b) => Value::Bool(*b),
            ConfigValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ConfigValue::String(s) => Value::String(s.clone()),
            ConfigValue::Integer(i) => Value::from(*i),
            ConfigValue::List(items) => Value::Array(items.clone()),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::String(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Integer(i)
    }
}

impl From<i32> for ConfigValue {
    fn from(i: i32) -> Self {
        ConfigValue::Integer(i.into())
    }
}

impl From<f64> for ConfigValue {
    fn from(f: f64) -> Self {
        ConfigValue::Float(f)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<Vec<Value>> for ConfigValue {
    fn from(items: Vec<Value>) -> Self {
        ConfigValue::List(items)
    }
}

/// What a decoded entry turns into inside a node.
#[derive(Debug)]
pub enum Entry<'a> {
    /// A scalar or list: becomes (or updates) a property.
    Value(ConfigValue),
    /// A nested object: becomes (or descends into) a child node.
    Object(&'a RawObject),
    /// Anything else; the payload names what was found.
    Unsupported(&'static str),
}

/// Classifies one decoded value.
pub fn classify(value: &Value) -> Entry<'_> {
    match value {
        Value::Bool(b) => Entry::Value(ConfigValue::Bool(*b)),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Entry::Value(ConfigValue::Integer(i)),
            (None, Some(f)) => Entry::Value(ConfigValue::Float(f)),
            (None, None) => Entry::Unsupported("number"),
        },
        Value::String(s) => Entry::Value(ConfigValue::String(s.clone())),
        Value::Array(items) => Entry::Value(ConfigValue::List(items.clone())),
        Value::Object(map) => Entry::Object(map),
        Value::Null => Entry::Unsupported("null"),
    }
}

/// Short name of a decoded value's shape, for diagnostics.
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_scalars() {
        assert!(matches!(
            classify(&json!(true)),
            Entry::Value(ConfigValue::Bool(true))
        ));
        assert!(matches!(
            classify(&json!(5)),
            Entry::Value(ConfigValue::Integer(5))
        ));
        assert!(matches!(
            classify(&json!(2.5)),
            Entry::Value(ConfigValue::Float(_))
        ));
        assert!(matches!(
            classify(&json!("x")),
            Entry::Value(ConfigValue::String(_))
        ));
        assert!(matches!(
            classify(&json!([1, "a"])),
            Entry::Value(ConfigValue::List(_))
        ));
    }

    #[test]
    fn test_classify_object_and_null() {
        assert!(matches!(classify(&json!({"a": 1})), Entry::Object(_)));
        assert!(matches!(classify(&Value::Null), Entry::Unsupported("null")));
    }

    #[test]
    fn test_large_unsigned_is_float() {
        let v = json!(u64::MAX);
        assert!(matches!(classify(&v), Entry::Value(ConfigValue::Float(_))));
    }

    #[test]
    fn test_coerce_widens_integer() {
        let widened = ConfigValue::Integer(7).coerce_to(ValueKind::Float).unwrap();
        assert_eq!(widened, ConfigValue::Float(7.0));
    }

    #[test]
    fn test_coerce_rejects_mismatch() {
        let rejected = ConfigValue::from("7").coerce_to(ValueKind::Integer);
        assert_eq!(rejected, Err(ConfigValue::from("7")));
        assert!(ConfigValue::Float(1.5).coerce_to(ValueKind::Integer).is_err());
    }

    #[test]
    fn test_serialize_untagged() {
        let v = ConfigValue::List(vec![json!(1), json!("two")]);
        assert_eq!(serde_json::to_value(&v).unwrap(), json!([1, "two"]));
        assert_eq!(ConfigValue::Integer(3).to_json(), json!(3));
    }
}
