//! # HTTP JSON-RPC Host
//!
//! Serves a [`MethodRegistry`](postrpc_json_rpc::MethodRegistry) over
//! HTTP/1.1. Every `POST` to the RPC path becomes one dispatch session; the
//! request body is streamed into the dispatcher and its single response is
//! written back with `Content-Type: application/json`.

pub mod handler;
pub mod server;

pub use handler::RpcHttpHandler;
pub use server::{HttpRpcServer, HttpRpcServerBuilder, ServerConfig};

pub use postrpc_json_rpc::{DispatchContext, MethodError, MethodRegistry, Params};

/// Result type for HTTP host operations
pub type Result<T> = std::result::Result<T, HttpRpcError>;

/// Errors raised by the HTTP host
#[derive(Debug, thiserror::Error)]
pub enum HttpRpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dispatcher error: {0}")]
    Dispatch(#[from] postrpc_json_rpc::DispatchError),
}
