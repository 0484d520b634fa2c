//! Per-request dispatch: body accumulation, classification, handler
//! invocation and single-shot response emission.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::{FutureExt, Stream, StreamExt};
use http::StatusCode;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, trace, warn};

use crate::envelope::{Inbound, classify};
use crate::error::{
    BODY_TOO_LARGE, BodyError, DispatchError, MethodError, RUNTIME_ERROR,
};
use crate::registry::{MethodRegistry, Params};
use crate::response::{JsonRpcResponse, ResponseOutcome};
use crate::sink::{OutboundResponse, ResponseSink};
use crate::types::RequestId;

/// Lifecycle of a dispatch session.
///
/// `Responded` and `Closed` are terminal; nothing leaves `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    BodyAccumulating,
    Parsed,
    Dispatched,
    Responded,
    Closed,
}

impl SessionState {
    fn accepts(self, next: SessionState) -> bool {
        match self {
            SessionState::Closed => false,
            SessionState::Responded => next == SessionState::Closed,
            _ => true,
        }
    }
}

struct SessionInner {
    registry: Arc<MethodRegistry>,
    sink: Box<dyn ResponseSink>,
    id: Mutex<Option<RequestId>>,
    responded: AtomicBool,
    state: Mutex<SessionState>,
}

/// Handle a method uses to answer its request.
///
/// Cheap to clone; a clone can be moved into a spawned task to answer later.
/// Only the first `respond`/`fail` across all clones reaches the transport.
#[derive(Clone)]
pub struct DispatchContext {
    inner: Arc<SessionInner>,
}

impl DispatchContext {
    fn new(registry: Arc<MethodRegistry>, sink: Box<dyn ResponseSink>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                registry,
                sink,
                id: Mutex::new(None),
                responded: AtomicBool::new(false),
                state: Mutex::new(SessionState::Created),
            }),
        }
    }

    /// Correlation id of the request, once parsed. `None` for id-less requests.
    pub fn id(&self) -> Option<RequestId> {
        self.inner.id.lock().clone()
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.lock()
    }

    pub fn is_responded(&self) -> bool {
        self.inner.responded.load(Ordering::Acquire)
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.inner.registry
    }

    /// Answer with a result. Returns whether a body was written.
    pub fn respond<T: Serialize>(&self, result: T) -> bool {
        match serde_json::to_value(result) {
            Ok(result) => self.emit(StatusCode::OK, ResponseOutcome::Result { result }, None),
            Err(e) => {
                error!(error = %e, "Failed to serialize RPC result");
                self.fail_as_sentinel(RUNTIME_ERROR)
            }
        }
    }

    /// Answer with an error message. Returns whether a body was written.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.emit(
            StatusCode::INTERNAL_SERVER_ERROR,
            ResponseOutcome::Error {
                error: message.into(),
            },
            None,
        )
    }

    /// Run another registry entry, public or private, against this session.
    pub async fn delegate(&self, name: &str, params: Params) -> Result<(), MethodError> {
        let method = self
            .inner
            .registry
            .get(name)
            .map(|entry| entry.method())
            .ok_or_else(|| MethodError::UnknownDelegate(name.to_string()))?;

        debug!(method = %name, "Delegating to registry entry");
        method.call(self.clone(), params).await
    }

    fn fail_as_sentinel(&self, message: &str) -> bool {
        self.emit(
            StatusCode::INTERNAL_SERVER_ERROR,
            ResponseOutcome::Error {
                error: message.to_string(),
            },
            Some(RequestId::sentinel()),
        )
    }

    fn set_id(&self, id: Option<RequestId>) {
        *self.inner.id.lock() = id;
    }

    fn advance(&self, next: SessionState) {
        let mut state = self.inner.state.lock();
        let current = *state;
        if current.accepts(next) {
            trace!(from = ?current, to = ?next, "Session state transition");
            *state = next;
        }
    }

    /// Write the terminal response unless one was already written.
    ///
    /// `id_override` replaces the session id for this response only.
    fn emit(
        &self,
        status: StatusCode,
        outcome: ResponseOutcome,
        id_override: Option<RequestId>,
    ) -> bool {
        if self.inner.responded.swap(true, Ordering::AcqRel) {
            warn!(
                id = ?self.id(),
                is_error = outcome.is_error(),
                "Response already sent for this request, ignoring"
            );
            return false;
        }

        let id = id_override.or_else(|| self.id());
        let body = id.and_then(|id| {
            let envelope = JsonRpcResponse {
                version: Default::default(),
                id,
                outcome,
            };
            serde_json::to_string(&envelope)
                .map_err(|e| error!(error = %e, "Failed to serialize JSON-RPC response"))
                .ok()
        });

        let wrote_body = body.is_some();
        debug!(status = %status, wrote_body, "Sending JSON-RPC response");

        self.advance(SessionState::Responded);
        self.inner.sink.deliver(OutboundResponse::new(status, body));
        self.advance(SessionState::Closed);
        wrote_body
    }

    fn reject_oversized(&self, limit: usize) {
        warn!(limit, "Rejecting oversized request body");
        self.emit(
            StatusCode::PAYLOAD_TOO_LARGE,
            ResponseOutcome::Error {
                error: BODY_TOO_LARGE.to_string(),
            },
            Some(RequestId::sentinel()),
        );
    }
}

/// Drives one request from raw body to terminal response.
pub struct Dispatcher<S> {
    source: S,
    context: DispatchContext,
    max_body_size: Option<usize>,
}

impl<S> Dispatcher<S> {
    pub fn builder() -> DispatcherBuilder<S> {
        DispatcherBuilder::new()
    }

    pub fn context(&self) -> &DispatchContext {
        &self.context
    }

    pub fn respond<T: Serialize>(&self, result: T) -> bool {
        self.context.respond(result)
    }

    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.context.fail(message)
    }
}

impl<S, B, E> Dispatcher<S>
where
    S: Stream<Item = Result<B, E>> + Unpin + Send,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    /// Read the request body to completion and decode it as UTF-8.
    pub async fn accumulate_body(&mut self) -> Result<String, BodyError> {
        self.context.advance(SessionState::BodyAccumulating);

        let mut buffer = Vec::new();
        while let Some(chunk) = self.source.next().await {
            let chunk = chunk.map_err(|e| BodyError::Stream(e.to_string()))?;
            let bytes = chunk.as_ref();

            if let Some(limit) = self.max_body_size
                && buffer.len() + bytes.len() > limit
            {
                return Err(BodyError::TooLarge { limit });
            }
            buffer.extend_from_slice(bytes);
        }

        trace!(bytes = buffer.len(), "Request body complete");
        Ok(String::from_utf8(buffer)?)
    }

    /// Classify `raw_body` and act on it.
    ///
    /// Returns once the handler's future completes; a handler may still answer
    /// later through a context clone it kept.
    pub async fn parse_and_run(&self, raw_body: &str) {
        let inbound = classify(raw_body, self.context.registry());
        self.context.advance(SessionState::Parsed);

        match inbound {
            Inbound::ParseError(reason) => {
                warn!(%reason, "Request body is not valid JSON");
                self.context.fail_as_sentinel(RUNTIME_ERROR);
            }
            Inbound::Invalid(rejected) => {
                warn!(id = ?rejected.id, error = %rejected.error, "Rejecting JSON-RPC request");
                self.context.set_id(rejected.id);
                self.context.fail(rejected.error.wire_message());
            }
            Inbound::Valid(request) => {
                debug!(
                    method = %request.method,
                    id = ?request.id,
                    params = request.params.len(),
                    "Dispatching JSON-RPC request"
                );
                self.context.set_id(request.id);
                self.context.advance(SessionState::Dispatched);

                let call = request.handler.call(self.context.clone(), request.params);
                match AssertUnwindSafe(call).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!(method = %request.method, error = %e, "RPC method failed");
                        self.context.fail_as_sentinel(RUNTIME_ERROR);
                    }
                    Err(panic) => {
                        error!(
                            method = %request.method,
                            panic = %panic_message(panic.as_ref()),
                            "RPC method panicked"
                        );
                        self.context.fail_as_sentinel(RUNTIME_ERROR);
                    }
                }
            }
        }
    }

    /// Full lifecycle: accumulate, parse, dispatch. Returns the state the
    /// session is in once the handler's future has completed.
    pub async fn run(mut self) -> SessionState {
        match self.accumulate_body().await {
            Ok(body) => self.parse_and_run(&body).await,
            Err(BodyError::TooLarge { limit }) => self.context.reject_oversized(limit),
            Err(e @ BodyError::InvalidUtf8(_)) => {
                warn!(error = %e, "Request body could not be decoded");
                self.context.fail_as_sentinel(RUNTIME_ERROR);
            }
            Err(e @ BodyError::Stream(_)) => {
                error!(error = %e, "Request stream failed, closing session without a response");
                self.context.advance(SessionState::Closed);
            }
        }
        self.context.state()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Builder for [`Dispatcher`]. Source, sink and registry are all required.
pub struct DispatcherBuilder<S> {
    source: Option<S>,
    sink: Option<Box<dyn ResponseSink>>,
    registry: Option<Arc<MethodRegistry>>,
    max_body_size: Option<usize>,
}

impl<S> DispatcherBuilder<S> {
    pub fn new() -> Self {
        Self {
            source: None,
            sink: None,
            registry: None,
            max_body_size: None,
        }
    }

    pub fn source(mut self, source: S) -> Self {
        self.source = Some(source);
        self
    }

    pub fn sink(mut self, sink: impl ResponseSink) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn registry(mut self, registry: Arc<MethodRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Reject bodies larger than `limit` bytes. Unlimited by default.
    pub fn max_body_size(mut self, limit: Option<usize>) -> Self {
        self.max_body_size = limit;
        self
    }

    pub fn build(self) -> Result<Dispatcher<S>, DispatchError> {
        let source = self
            .source
            .ok_or(DispatchError::InvalidConfiguration("request source is required"))?;
        let sink = self
            .sink
            .ok_or(DispatchError::InvalidConfiguration("response sink is required"))?;
        let registry = self
            .registry
            .ok_or(DispatchError::InvalidConfiguration("method registry is required"))?;

        Ok(Dispatcher {
            source,
            context: DispatchContext::new(registry, sink),
            max_body_size: self.max_body_size,
        })
    }
}

impl<S> Default for DispatcherBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
