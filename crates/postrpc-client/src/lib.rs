//! # JSON-RPC over HTTP Client
//!
//! [`Invoker`] sends one JSON-RPC 2.0 request per HTTP `POST` to a fixed
//! endpoint and reports the server's answer as an [`RpcOutcome`].
//!
//! ```rust,no_run
//! use postrpc_client::{Invoker, RpcOutcome, rpc_params};
//!
//! # async fn demo() -> postrpc_client::ClientResult<()> {
//! let invoker = Invoker::new("http://127.0.0.1:9080/")?;
//! match invoker.invoke("insert", rpc_params![2, 2]).await? {
//!     RpcOutcome::Result(value) => println!("result: {}", value),
//!     RpcOutcome::Error(message) => println!("error: {}", message),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
pub mod invoker;

pub use config::{ClientConfig, TimeoutConfig};
pub use endpoint::Endpoint;
pub use error::{ClientError, ClientResult, ProtocolError};
pub use invoker::{Invoker, RpcOutcome, interpret_response, next_request_id};

#[doc(hidden)]
pub use serde_json as __serde_json;

/// Build a positional parameter list from anything `serde_json::json!` accepts.
#[macro_export]
macro_rules! rpc_params {
    () => {
        ::std::vec::Vec::<$crate::__serde_json::Value>::new()
    };
    ($($param:expr),+ $(,)?) => {
        vec![$($crate::__serde_json::json!($param)),+]
    };
}
