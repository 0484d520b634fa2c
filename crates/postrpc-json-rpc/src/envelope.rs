//! Classification of a raw request body into something the dispatcher can act on.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::registry::{MethodRegistry, Params, RpcMethod};
use crate::types::RequestId;

/// A request that passed validation, with its handler already resolved.
pub struct ValidRequest {
    pub id: Option<RequestId>,
    pub method: String,
    pub params: Params,
    pub handler: Arc<dyn RpcMethod>,
}

impl fmt::Debug for ValidRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidRequest")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A body that parsed as JSON but is not an acceptable request.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRequest {
    pub id: Option<RequestId>,
    pub error: ValidationError,
}

/// The three ways an inbound body can turn out.
#[derive(Debug)]
pub enum Inbound {
    Valid(ValidRequest),
    ParseError(String),
    Invalid(RejectedRequest),
}

/// Parse and validate `raw_body` against `registry`.
///
/// Envelope shape is checked before the method, so an unusable `params`
/// field is reported as an invalid request even when the method is unknown.
pub fn classify(raw_body: &str, registry: &MethodRegistry) -> Inbound {
    let value: Value = match serde_json::from_str(raw_body) {
        Ok(value) => value,
        Err(e) => return Inbound::ParseError(e.to_string()),
    };

    let object = match value {
        Value::Object(object) if !object.is_empty() => object,
        _ => return reject(None, ValidationError::EmptyEnvelope),
    };

    let id = match object.get("id").map(RequestId::from_value).transpose() {
        Ok(id) => id.flatten(),
        Err(error) => return reject(None, error),
    };

    let params = match extract_params(&object) {
        Ok(params) => params,
        Err(error) => return reject(id, error),
    };

    let method = match object.get("method") {
        Some(Value::String(method)) => method.clone(),
        _ => return reject(id, ValidationError::MissingMethod),
    };

    match registry.resolve_public(&method) {
        Ok(handler) => Inbound::Valid(ValidRequest {
            id,
            method,
            params,
            handler,
        }),
        Err(error) => reject(id, error),
    }
}

fn extract_params(object: &Map<String, Value>) -> Result<Params, ValidationError> {
    match object.get("params") {
        None | Some(Value::Null) => Ok(Params::default()),
        Some(Value::Array(values)) => Ok(Params::new(values.clone())),
        Some(_) => Err(ValidationError::UnsupportedParams),
    }
}

fn reject(id: Option<RequestId>, error: ValidationError) -> Inbound {
    Inbound::Invalid(RejectedRequest { id, error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchContext;
    use crate::error::MethodError;
    use serde_json::json;

    async fn noop(_ctx: DispatchContext, _params: Params) -> Result<(), MethodError> {
        Ok(())
    }

    fn registry() -> MethodRegistry {
        MethodRegistry::new()
            .with_method("insert", noop)
            .with_method("_private", noop)
    }

    fn rejected(body: &str) -> RejectedRequest {
        match classify(body, &registry()) {
            Inbound::Invalid(rejected) => rejected,
            other => panic!("expected rejection for {body}, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_request() {
        let body = r#"{"jsonrpc":"2.0","method":"insert","params":[1,2],"id":1}"#;
        match classify(body, &registry()) {
            Inbound::Valid(request) => {
                assert_eq!(request.id, Some(RequestId::from(1i64)));
                assert_eq!(request.method, "insert");
                assert_eq!(request.params.into_inner(), vec![json!(1), json!(2)]);
            }
            other => panic!("expected valid request, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_params_and_id() {
        match classify(r#"{"method":"insert"}"#, &registry()) {
            Inbound::Valid(request) => {
                assert_eq!(request.id, None);
                assert!(request.params.is_empty());
            }
            other => panic!("expected valid request, got {other:?}"),
        }
    }

    #[test]
    fn test_null_id_is_id_less() {
        match classify(r#"{"method":"insert","id":null}"#, &registry()) {
            Inbound::Valid(request) => assert_eq!(request.id, None),
            other => panic!("expected valid request, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            classify("not-json", &registry()),
            Inbound::ParseError(_)
        ));
        assert!(matches!(classify("", &registry()), Inbound::ParseError(_)));
    }

    #[test]
    fn test_empty_and_non_object_envelopes() {
        for body in ["{}", "[]", "null", "42", r#""insert""#, r#"[{"method":"insert","id":1}]"#] {
            assert_eq!(
                rejected(body),
                RejectedRequest {
                    id: None,
                    error: ValidationError::EmptyEnvelope
                },
                "body: {body}"
            );
        }
    }

    #[test]
    fn test_named_params_rejected_with_id() {
        let rejected = rejected(r#"{"method":"insert","params":{"a":1},"id":4}"#);
        assert_eq!(rejected.id, Some(RequestId::from(4i64)));
        assert_eq!(rejected.error, ValidationError::UnsupportedParams);
        assert_eq!(rejected.error.wire_message(), "Invalid request");
    }

    #[test]
    fn test_invalid_id_type() {
        let rejected = rejected(r#"{"method":"insert","id":true}"#);
        assert_eq!(rejected.id, None);
        assert_eq!(rejected.error, ValidationError::InvalidId);
    }

    #[test]
    fn test_private_method_rejected() {
        let rejected = rejected(r#"{"jsonrpc":"2.0","method":"_private","id":2}"#);
        assert_eq!(rejected.id, Some(RequestId::from(2i64)));
        assert_eq!(rejected.error.wire_message(), "Invalid request method");
    }

    #[test]
    fn test_method_problems() {
        assert_eq!(
            rejected(r#"{"id":"a","params":[]}"#).error,
            ValidationError::MissingMethod
        );
        assert_eq!(
            rejected(r#"{"id":"a","method":42}"#).error,
            ValidationError::MissingMethod
        );
        assert_eq!(
            rejected(r#"{"id":"a","method":""}"#).error,
            ValidationError::MissingMethod
        );
        assert_eq!(
            rejected(r#"{"id":"a","method":"subtract"}"#).error,
            ValidationError::UnknownMethod("subtract".into())
        );
    }
}
