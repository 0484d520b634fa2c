//! # JSON-RPC 2.0 Dispatcher
//!
//! Transport-agnostic handling of a single JSON-RPC request: the dispatcher
//! reads a body from any byte stream, classifies it, routes it through a
//! [`MethodRegistry`] and writes exactly one response to a [`ResponseSink`].
//!
//! Methods whose name starts with `_` (or that were registered as private)
//! are never reachable from the wire, only through
//! [`DispatchContext::delegate`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use postrpc_json_rpc::prelude::*;
//!
//! # async fn demo() -> Result<(), DispatchError> {
//! let registry = Arc::new(MethodRegistry::new().with_method(
//!     "echo",
//!     |ctx: DispatchContext, params: Params| async move {
//!         ctx.respond(params.into_inner());
//!         Ok::<_, MethodError>(())
//!     },
//! ));
//!
//! let (sink, response) = ChannelSink::new();
//! let body = futures::stream::iter(vec![Ok::<_, std::io::Error>(
//!     br#"{"jsonrpc":"2.0","method":"echo","params":[1],"id":1}"#.to_vec(),
//! )]);
//!
//! Dispatcher::builder()
//!     .source(body)
//!     .sink(sink)
//!     .registry(registry)
//!     .build()?
//!     .run()
//!     .await;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod prelude;
pub mod registry;
pub mod request;
pub mod response;
pub mod sink;
pub mod types;

pub use dispatch::{DispatchContext, Dispatcher, DispatcherBuilder, SessionState};
pub use envelope::{Inbound, RejectedRequest, ValidRequest, classify};
pub use error::{BodyError, DispatchError, MethodError, ValidationError};
pub use registry::{MethodEntry, MethodRegistry, Params, RpcMethod, Visibility};
pub use request::JsonRpcRequest;
pub use response::{JsonRpcResponse, ResponseOutcome};
pub use sink::{ChannelSink, OutboundResponse, ResponseSink};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Id carried by responses to requests whose own id is unknown or unusable.
pub const SENTINEL_ID: i64 = -1;
