//! Methods served by the demo server.
//!
//! - `insert(a, b)`: answers `"Params are OK!"` when both parameters are
//!   equal, otherwise fails with `"Params doesn't match!"`.
//! - `echo(...)`: returns its parameters as an array.
//! - `audited(...)`: hands the request to the private `_private` method.
//! - `_private`: never reachable from the wire.

use postrpc_json_rpc::{DispatchContext, MethodError, MethodRegistry, Params};
use tracing::info;

/// Greeting served for non-`POST` requests
pub const GREETING: &str = "Hello world!";

pub const PARAMS_OK: &str = "Params are OK!";
pub const PARAMS_MISMATCH: &str = "Params doesn't match!";

pub async fn insert(ctx: DispatchContext, params: Params) -> Result<(), MethodError> {
    if params.get(0) == params.get(1) {
        ctx.respond(PARAMS_OK);
    } else {
        ctx.fail(PARAMS_MISMATCH);
    }
    Ok(())
}

pub async fn echo(ctx: DispatchContext, params: Params) -> Result<(), MethodError> {
    ctx.respond(params.into_inner());
    Ok(())
}

pub async fn audited(ctx: DispatchContext, params: Params) -> Result<(), MethodError> {
    info!(id = ?ctx.id(), params = params.len(), "Audited call");
    ctx.delegate("_private", params).await
}

pub async fn private(ctx: DispatchContext, params: Params) -> Result<(), MethodError> {
    ctx.respond(serde_json::json!({ "private": true, "params": params.len() }));
    Ok(())
}

/// Registry with every demo method
pub fn demo_registry() -> MethodRegistry {
    MethodRegistry::new()
        .with_method("insert", insert)
        .with_method("echo", echo)
        .with_method("audited", audited)
        .with_method("_private", private)
}
