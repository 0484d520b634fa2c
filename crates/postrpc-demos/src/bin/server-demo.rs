//! Demo JSON-RPC server
//!
//! Usage:
//! ```bash
//! RUST_LOG=debug cargo run --bin server-demo -- --bind 127.0.0.1:9080
//! ```

use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use postrpc_demos::{GREETING, demo_registry};
use postrpc_http_server::HttpRpcServer;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "server-demo")]
#[command(about = "Serve the demo JSON-RPC methods over HTTP")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:9080")]
    bind: SocketAddr,

    /// Only accept RPC calls on this path (default: any path)
    #[arg(long)]
    path: Option<String>,

    /// Maximum request body size in bytes (0 for unlimited)
    #[arg(long, default_value_t = 1024 * 1024)]
    max_body_size: usize,
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

    let mut builder = HttpRpcServer::builder()
        .bind_address(args.bind)
        .registry(demo_registry())
        .greeting(GREETING);
    if let Some(path) = args.path {
        builder = builder.rpc_path(path);
    }
    builder = match args.max_body_size {
        0 => builder.unlimited_body(),
        limit => builder.max_body_size(limit),
    };

    let server = builder.build();
    info!("Starting demo server on {}", args.bind);
    server.run().await?;
    Ok(())
}
