use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{JsonRpcVersion, RequestId};

/// A JSON-RPC request as it appears on the wire.
///
/// Only positional parameters are supported. A request without an id is still
/// dispatched, but its response carries no body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl JsonRpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params,
            id: Some(id),
        }
    }

    /// Create a request that expects no response body
    pub fn without_id(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params,
            id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let request = JsonRpcRequest::new(RequestId::from(1i64), "insert", vec![json!(1), json!(2)]);
        let json_str = serde_json::to_string(&request).unwrap();

        assert_eq!(
            json_str,
            r#"{"jsonrpc":"2.0","method":"insert","params":[1,2],"id":1}"#
        );
    }

    #[test]
    fn test_request_without_id_omits_field() {
        let request = JsonRpcRequest::without_id("ping", vec![]);
        let json_str = serde_json::to_string(&request).unwrap();

        assert!(!json_str.contains("\"id\""));
        assert!(json_str.contains("\"params\":[]"));
    }

    #[test]
    fn test_missing_params_default_to_empty() {
        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"ping","id":"a"}"#).unwrap();

        assert!(request.params.is_empty());
        assert_eq!(request.id, Some(RequestId::from("a")));
    }
}
