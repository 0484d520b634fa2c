//! Common imports for code that registers and implements RPC methods.

pub use crate::dispatch::{DispatchContext, Dispatcher, SessionState};
pub use crate::error::{DispatchError, MethodError};
pub use crate::registry::{MethodRegistry, Params, RpcMethod};
pub use crate::sink::{ChannelSink, OutboundResponse, ResponseSink};
pub use crate::types::RequestId;
