use thiserror::Error;

/// Wire message for bodies that fail to parse and for failures while dispatching.
pub const RUNTIME_ERROR: &str = "Runtime error";
/// Wire message for envelopes that are not a usable request object.
pub const INVALID_REQUEST: &str = "Invalid request";
/// Wire message for envelopes naming a method that cannot be invoked.
pub const INVALID_REQUEST_METHOD: &str = "Invalid request method";
/// Wire message for bodies over the configured size limit.
pub const BODY_TOO_LARGE: &str = "Request body too large";

/// Errors raised while wiring up a dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
}

/// Failures while buffering a request body.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("request body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("request stream failed: {0}")]
    Stream(String),
}

/// Reasons an envelope is rejected before any handler runs.
///
/// `Display` is meant for logs; [`ValidationError::wire_message`] is what the
/// remote peer sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("envelope is not a non-empty object")]
    EmptyEnvelope,

    #[error("id must be a number, a string or null")]
    InvalidId,

    #[error("params must be an array")]
    UnsupportedParams,

    #[error("method name is missing or empty")]
    MissingMethod,

    #[error("method '{0}' is private")]
    PrivateMethod(String),

    #[error("method '{0}' is not registered")]
    UnknownMethod(String),
}

impl ValidationError {
    pub fn wire_message(&self) -> &'static str {
        match self {
            ValidationError::EmptyEnvelope
            | ValidationError::InvalidId
            | ValidationError::UnsupportedParams => INVALID_REQUEST,
            ValidationError::MissingMethod
            | ValidationError::PrivateMethod(_)
            | ValidationError::UnknownMethod(_) => INVALID_REQUEST_METHOD,
        }
    }
}

/// Errors a method handler can return instead of answering through its context.
///
/// Any of these turns into a `"Runtime error"` response unless the handler
/// already answered.
#[derive(Debug, Error)]
pub enum MethodError {
    #[error("{0}")]
    Message(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("method '{0}' is not registered")]
    UnknownDelegate(String),
}

impl MethodError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams(message.into())
    }
}
