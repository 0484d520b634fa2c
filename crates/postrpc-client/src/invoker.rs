//! Sending one JSON-RPC request per HTTP POST.

use std::time::Instant;

use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, warn};

use postrpc_json_rpc::error::RUNTIME_ERROR;
use postrpc_json_rpc::{JsonRpcRequest, RequestId};

use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::{ClientError, ClientResult, ProtocolError};

/// Largest integer a JSON number can carry without losing precision (2^53 - 1).
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// What the server answered.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcOutcome {
    Result(Value),
    Error(String),
}

impl RpcOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, RpcOutcome::Error(_))
    }

    pub fn into_result(self) -> Result<Value, String> {
        match self {
            RpcOutcome::Result(value) => Ok(value),
            RpcOutcome::Error(message) => Err(message),
        }
    }
}

/// JSON-RPC client bound to a single endpoint.
#[derive(Debug, Clone)]
pub struct Invoker {
    client: Client,
    endpoint: Endpoint,
}

impl Invoker {
    /// Create an invoker with default timeouts
    pub fn new(endpoint: &str) -> ClientResult<Self> {
        Self::with_config(endpoint, &ClientConfig::default())
    }

    pub fn with_config(endpoint: &str, config: &ClientConfig) -> ClientResult<Self> {
        let endpoint = Endpoint::parse(endpoint)?;

        let client = Client::builder()
            .connect_timeout(config.timeouts.connect)
            .timeout(config.timeouts.request)
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| ClientError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    /// Create an invoker around an existing HTTP client
    pub fn with_client(endpoint: &str, client: Client) -> ClientResult<Self> {
        Ok(Self {
            client,
            endpoint: Endpoint::parse(endpoint)?,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Call `method` with positional `params` and wait for the outcome.
    pub async fn invoke(&self, method: &str, params: Vec<Value>) -> ClientResult<RpcOutcome> {
        if method.is_empty() {
            return Err(ClientError::EmptyMethod);
        }

        let id = next_request_id();
        let body = serde_json::to_string(&JsonRpcRequest::new(id.clone(), method, params))?;

        debug!(method = %method, id = %id, endpoint = %self.endpoint, "Sending JSON-RPC request");
        let start_time = Instant::now();

        let response = self
            .client
            .post(self.endpoint.url().clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(
            status = %status,
            bytes = bytes.len(),
            elapsed_ms = start_time.elapsed().as_millis(),
            "JSON-RPC response received"
        );

        let raw = std::str::from_utf8(&bytes).map_err(|_| ProtocolError::InvalidEncoding)?;
        interpret_response(raw, &id)
    }

    /// Callback form of [`invoke`](Self::invoke).
    ///
    /// The callback runs once with the server's outcome. Failures that leave
    /// no outcome are returned instead and the callback is not run.
    pub async fn invoke_with_callback<F>(
        &self,
        method: &str,
        params: Vec<Value>,
        callback: F,
    ) -> ClientResult<()>
    where
        F: FnOnce(RpcOutcome),
    {
        let outcome = self.invoke(method, params).await?;
        callback(outcome);
        Ok(())
    }
}

/// Random correlation id in `0..=2^53-1`.
pub fn next_request_id() -> RequestId {
    RequestId::from(rand::random::<u64>() & MAX_SAFE_INTEGER)
}

/// Interpret a raw response body for the request identified by `expected`.
///
/// A present `result` field, even `null`, is success. Otherwise the outcome is
/// the server's `error` string, or `"Runtime error"` when there is none. A
/// response carrying the sentinel id is accepted for any request, since the
/// server uses it when it could not read the request's own id.
pub fn interpret_response(raw: &str, expected: &RequestId) -> ClientResult<RpcOutcome> {
    if raw.trim().is_empty() {
        return Err(ProtocolError::InvalidResponse("empty response body".to_string()).into());
    }

    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ProtocolError::InvalidResponse(format!("not JSON: {}", e)))?;
    let object = value
        .as_object()
        .ok_or_else(|| ProtocolError::InvalidResponse("not a JSON object".to_string()))?;

    let actual = match object.get("id").map(RequestId::from_value) {
        Some(Ok(Some(id))) => id,
        _ => {
            return Err(ProtocolError::InvalidResponse("missing or invalid id".to_string()).into());
        }
    };
    if &actual != expected && !actual.is_sentinel() {
        return Err(ProtocolError::IdMismatch {
            expected: expected.clone(),
            actual,
        }
        .into());
    }

    if let Some(result) = object.get("result") {
        return Ok(RpcOutcome::Result(result.clone()));
    }

    let message = match object.get("error") {
        Some(Value::String(message)) => message.clone(),
        other => {
            warn!(error = ?other, "Response carries neither result nor error message");
            RUNTIME_ERROR.to_string()
        }
    };
    Ok(RpcOutcome::Error(message))
}
