use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{JsonRpcVersion, RequestId};

/// Payload of a response: a result or an error message, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseOutcome {
    Error { error: String },
    Result { result: Value },
}

impl ResponseOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ResponseOutcome::Error { .. })
    }
}

/// A JSON-RPC response as written by the dispatcher.
///
/// Serializes as `{"jsonrpc":"2.0","id":..,"result":..}` or
/// `{"jsonrpc":"2.0","id":..,"error":".."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: RequestId,
    #[serde(flatten)]
    pub outcome: ResponseOutcome,
}

impl JsonRpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            outcome: ResponseOutcome::Result { result },
        }
    }

    pub fn error(id: RequestId, message: impl Into<String>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            outcome: ResponseOutcome::Error {
                error: message.into(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_error()
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            ResponseOutcome::Result { result } => Some(result),
            ResponseOutcome::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            ResponseOutcome::Error { error } => Some(error),
            ResponseOutcome::Result { .. } => None,
        }
    }
}
