use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primary key of a record inside a store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Text(String),
}

impl Key {
    /// Reads a key out of a JSON scalar. Floats and non-scalars are not keys.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_i64().map(Self::Int),
            Value::String(text) => Some(Self::Text(text.clone())),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(id) => Value::from(*id),
            Self::Text(text) => Value::from(text.as_str()),
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(id) => Some(*id),
            Self::Text(_) => None,
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Identifier issued by the remote vault (vault ids and commit ids).
///
/// The server may hand out either integers or opaque strings; only integer
/// ids carry an ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Int(i64),
    Text(String),
}

impl RemoteId {
    /// Whether `self` may legitimately come after `previous` in a commit chain.
    #[must_use]
    pub fn follows(&self, previous: &RemoteId) -> bool {
        match (self, previous) {
            (Self::Int(next), Self::Int(prev)) => next > prev,
            (next, prev) => next != prev,
        }
    }
}

impl std::fmt::Display for RemoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for RemoteId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for RemoteId {
    fn from(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(id) => Self::Int(id),
            Err(_) => Self::Text(value.to_string()),
        }
    }
}
