//! Demo JSON-RPC client
//!
//! Usage:
//! ```bash
//! # Start the server first:
//! cargo run --bin server-demo
//!
//! cargo run --bin client-demo -- --endpoint http://127.0.0.1:9080/
//! ```

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use postrpc_client::{ClientConfig, Invoker, RpcOutcome, rpc_params};
use serde_json::Value;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "client-demo")]
#[command(about = "Call the demo JSON-RPC methods")]
struct Args {
    /// Server endpoint URL
    #[arg(long, default_value = "http://127.0.0.1:9080/")]
    endpoint: String,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config =
        ClientConfig::default().with_request_timeout(Duration::from_millis(args.timeout_ms));
    let invoker = Invoker::with_config(&args.endpoint, &config)?;
    info!("Calling {}", invoker.endpoint());

    let calls: Vec<(&str, Vec<Value>)> = vec![
        ("insert", rpc_params![1, 2]),
        ("insert", rpc_params![2, 2]),
        ("echo", rpc_params!["hello", serde_json::json!({ "nested": [1, 2, 3] })]),
        ("audited", rpc_params![42]),
        ("_private", rpc_params![]),
        ("subtract", rpc_params![3, 1]),
    ];

    for (method, params) in calls {
        invoker
            .invoke_with_callback(method, params, |outcome| match outcome {
                RpcOutcome::Result(value) => info!("{} -> result {}", method, value),
                RpcOutcome::Error(message) => warn!("{} -> error {:?}", method, message),
            })
            .await?;
    }

    Ok(())
}
