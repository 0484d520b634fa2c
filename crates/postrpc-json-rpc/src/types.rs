use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

use crate::error::ValidationError;

/// JSON-RPC protocol version marker. Always serializes as `"2.0"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JsonRpcVersion {
    #[default]
    #[serde(rename = "2.0")]
    V2_0,
}

/// Correlation id linking a request to its response.
///
/// A missing or `null` id is modelled as `Option::<RequestId>::None` by the
/// envelope types rather than as a variant here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(Number),
    String(String),
}

impl RequestId {
    /// Id used for responses to bodies that could not be parsed at all.
    pub fn sentinel() -> Self {
        RequestId::Number(Number::from(crate::SENTINEL_ID))
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, RequestId::Number(n) if n.as_i64() == Some(crate::SENTINEL_ID))
    }

    /// Interpret an arbitrary JSON value as an id.
    ///
    /// `Ok(None)` for `null`; booleans, arrays and objects are rejected.
    pub fn from_value(value: &Value) -> Result<Option<Self>, ValidationError> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(Some(RequestId::Number(n.clone()))),
            Value::String(s) => Ok(Some(RequestId::String(s.clone()))),
            _ => Err(ValidationError::InvalidId),
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        RequestId::Number(Number::from(value))
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        RequestId::Number(Number::from(value))
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        RequestId::String(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        RequestId::String(value.to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::String(s) => write!(f, "\"{}\"", s),
        }
    }
}
