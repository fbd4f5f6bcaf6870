use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a remote resource.
///
/// Servers hand these out either as strings (channel URLs, user ids) or as
/// plain numbers; both forms render the same way in URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectId {
    Num(i64),
    Str(String),
}

impl ObjectId {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ObjectId::Str(s) => Some(s),
            ObjectId::Num(_) => None,
        }
    }

    /// Reads an identifier out of a JSON value, if it has an id-like shape.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(ObjectId::Str(s.clone())),
            serde_json::Value::Number(n) => n.as_i64().map(ObjectId::Num),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Num(n) => write!(f, "{n}"),
            ObjectId::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        ObjectId::Str(value.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        ObjectId::Str(value)
    }
}

impl From<i64> for ObjectId {
    fn from(value: i64) -> Self {
        ObjectId::Num(value)
    }
}

impl PartialEq<str> for ObjectId {
    fn eq(&self, other: &str) -> bool {
        matches!(self, ObjectId::Str(s) if s == other)
    }
}

impl PartialEq<&str> for ObjectId {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
