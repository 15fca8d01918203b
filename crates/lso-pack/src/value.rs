//! [`Value`]: the structured value shared by every decoder in this crate.
//!
//! The embedded-document scanner, the binary plist decoder and the
//! keyed-archive resolver all produce and consume this one type, so a
//! caller can treat a scanned JSON preset and an unarchived object graph
//! the same way.

use std::fmt;

use base64::Engine;
use indexmap::IndexMap;

/// Ordered string-keyed mapping. Equality ignores key order.
pub type Mapping = IndexMap<String, Value>;

/// A decoded structured value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// Integers that fit in i64. Wider plist integers decode as `Float`.
    Integer(i64),
    Float(f64),
    Text(String),
    /// Opaque binary data (plist `<data>`).
    Bytes(Vec<u8>),
    /// Seconds since 2001-01-01T00:00:00Z (plist `<date>`).
    Date(f64),
    Sequence(Vec<Value>),
    Mapping(Mapping),
    /// Keyed-archive back-reference into the object table. Never present in
    /// a resolved graph.
    Reference(u64),
    /// Stand-in left by the resolver where a reference could not be followed.
    Placeholder(Placeholder),
}

/// Why the resolver could not materialize a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// The index is outside the object table.
    Dangling(u64),
    /// The index is already being resolved on the current path.
    Cyclic(u64),
    /// Nesting grew past the configured depth limit while resolving this
    /// index (0 when no reference had been followed yet).
    DepthLimit(u64),
    /// The node budget ran out while resolving this index.
    NodeLimit(u64),
}

impl Placeholder {
    /// The object-table index the placeholder stands in for.
    pub fn index(&self) -> u64 {
        match *self {
            Placeholder::Dangling(i)
            | Placeholder::Cyclic(i)
            | Placeholder::DepthLimit(i)
            | Placeholder::NodeLimit(i) => i,
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placeholder::Dangling(i) => write!(f, "<Invalid UID {i}>"),
            Placeholder::Cyclic(i) => write!(f, "<Cyclic UID {i}>"),
            Placeholder::DepthLimit(i) => write!(f, "<UID {i} too deep>"),
            Placeholder::NodeLimit(i) => write!(f, "<UID {i} too large>"),
        }
    }
}

impl Value {
    /// Looks up a key when the value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Value::Placeholder(_))
    }

    /// Whether any `Reference` node remains anywhere in the tree.
    pub fn contains_reference(&self) -> bool {
        match self {
            Value::Reference(_) => true,
            Value::Sequence(items) => items.iter().any(Value::contains_reference),
            Value::Mapping(map) => map.values().any(Value::contains_reference),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(arr) => {
                Value::Sequence(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => Value::Mapping(
                obj.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::from(i),
            Value::Float(f) | Value::Date(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s),
            Value::Bytes(b) => {
                serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(b))
            }
            Value::Sequence(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Mapping(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
            Value::Reference(i) => serde_json::json!({ "$ref": i }),
            Value::Placeholder(p) => serde_json::Value::String(p.to_string()),
        }
    }
}
