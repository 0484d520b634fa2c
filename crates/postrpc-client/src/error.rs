//! Error types for client operations

use thiserror::Error;

use postrpc_json_rpc::RequestId;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures that prevent an RPC outcome from being produced.
///
/// A server answering with an `error` field is not a `ClientError`; it is an
/// [`RpcOutcome::Error`](crate::RpcOutcome::Error).
#[derive(Error, Debug)]
pub enum ClientError {
    /// Method name was empty; nothing was sent
    #[error("Method name must not be empty")]
    EmptyMethod,

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Network/connection errors
    #[error("Connection error: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    /// Protocol-level errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// The server's reply could not be interpreted
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Response body is not valid UTF-8")]
    InvalidEncoding,

    #[error("Invalid JSON-RPC response: {0}")]
    InvalidResponse(String),

    #[error("Response id {actual} does not match request id {expected}")]
    IdMismatch {
        expected: RequestId,
        actual: RequestId,
    },
}

impl ClientError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if the request never reached the server or its reply was lost
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout)
    }

    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Connection(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ClientError::Timeout.is_transport_error());
        assert!(!ClientError::EmptyMethod.is_transport_error());

        let err: ClientError = ProtocolError::InvalidResponse("empty body".into()).into();
        assert!(err.is_protocol_error());
        assert_eq!(
            err.to_string(),
            "Protocol error: Invalid JSON-RPC response: empty body"
        );
    }

    #[test]
    fn test_id_mismatch_message() {
        let err = ProtocolError::IdMismatch {
            expected: RequestId::from(7i64),
            actual: RequestId::from("seven"),
        };
        assert_eq!(
            err.to_string(),
            "Response id \"seven\" does not match request id 7"
        );
    }
}
