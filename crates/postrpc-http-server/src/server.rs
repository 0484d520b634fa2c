//! HTTP JSON-RPC server: configuration, builder and accept loop.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use postrpc_json_rpc::{MethodRegistry, RpcMethod};

use crate::{Result, RpcHttpHandler};

/// Default request body limit (1 MiB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Configuration for the HTTP JSON-RPC server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Path that accepts RPC calls; `None` accepts `POST` on any path
    pub rpc_path: Option<String>,
    /// Maximum request body size; `None` for unlimited
    pub max_body_size: Option<usize>,
    /// Plain-text body returned for non-`POST` requests
    pub greeting: Option<String>,
}

impl ServerConfig {
    pub(crate) fn accepts_path(&self, path: &str) -> bool {
        self.rpc_path.as_deref().is_none_or(|rpc_path| rpc_path == path)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 9080)),
            rpc_path: None,
            max_body_size: Some(DEFAULT_MAX_BODY_SIZE),
            greeting: None,
        }
    }
}

/// Builder for [`HttpRpcServer`]
pub struct HttpRpcServerBuilder {
    config: ServerConfig,
    registry: MethodRegistry,
}

impl HttpRpcServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            registry: MethodRegistry::new(),
        }
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Only accept RPC calls on `path`
    pub fn rpc_path(mut self, path: impl Into<String>) -> Self {
        self.config.rpc_path = Some(path.into());
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = Some(size);
        self
    }

    /// Accept request bodies of any size
    pub fn unlimited_body(mut self) -> Self {
        self.config.max_body_size = None;
        self
    }

    pub fn greeting(mut self, greeting: impl Into<String>) -> Self {
        self.config.greeting = Some(greeting.into());
        self
    }

    /// Replace the method registry wholesale
    pub fn registry(mut self, registry: MethodRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Register a method; names starting with `_` are private
    pub fn method<M>(mut self, name: impl Into<String>, method: M) -> Self
    where
        M: RpcMethod + 'static,
    {
        self.registry.register(name, method);
        self
    }

    /// Register a method reachable only through delegation
    pub fn private_method<M>(mut self, name: impl Into<String>, method: M) -> Self
    where
        M: RpcMethod + 'static,
    {
        self.registry.register_private(name, method);
        self
    }

    pub fn build(self) -> HttpRpcServer {
        HttpRpcServer {
            handler: RpcHttpHandler::new(self.config, Arc::new(self.registry)),
        }
    }
}

impl Default for HttpRpcServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP/1.1 JSON-RPC server
#[derive(Clone)]
pub struct HttpRpcServer {
    handler: RpcHttpHandler,
}

impl HttpRpcServer {
    pub fn builder() -> HttpRpcServerBuilder {
        HttpRpcServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.handler.config
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.handler.registry
    }

    /// Bind to the configured address and serve until the listener fails
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config().bind_address).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        info!("HTTP JSON-RPC server listening on {}", listener.local_addr()?);
        match &self.config().rpc_path {
            Some(path) => info!("RPC endpoint available at: {}", path),
            None => info!("RPC endpoint available on every path"),
        }
        info!("Public methods: {:?}", self.registry().public_methods());

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            debug!("New connection from {}", peer_addr);

            let handler = self.handler.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let handler = handler.clone();
                    async move { Ok::<_, Infallible>(handler.handle(req).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    if err.is_incomplete_message() {
                        debug!("Client disconnected (normal): {}", err);
                    } else {
                        error!("Error serving connection: {}", err);
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postrpc_json_rpc::{DispatchContext, MethodError, Params, Visibility};
    use std::net::{IpAddr, Ipv4Addr};

    async fn noop(_ctx: DispatchContext, _params: Params) -> std::result::Result<(), MethodError> {
        Ok(())
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address.port(), 9080);
        assert_eq!(config.rpc_path, None);
        assert_eq!(config.max_body_size, Some(1024 * 1024));
        assert!(config.greeting.is_none());
        assert!(config.accepts_path("/anything"));
    }

    #[test]
    fn test_builder() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 3000);
        let server = HttpRpcServer::builder()
            .bind_address(addr)
            .rpc_path("/api/rpc")
            .max_body_size(2048)
            .greeting("Hello world!")
            .method("insert", noop)
            .method("_private", noop)
            .private_method("helper", noop)
            .build();

        let config = server.config();
        assert_eq!(config.bind_address, addr);
        assert_eq!(config.rpc_path.as_deref(), Some("/api/rpc"));
        assert_eq!(config.max_body_size, Some(2048));
        assert!(config.accepts_path("/api/rpc"));
        assert!(!config.accepts_path("/"));

        let registry = server.registry();
        assert_eq!(registry.public_methods(), vec!["insert".to_string()]);
        assert_eq!(
            registry.get("helper").map(|entry| entry.visibility()),
            Some(Visibility::Private)
        );
    }

    #[test]
    fn test_unlimited_body() {
        let server = HttpRpcServer::builder().max_body_size(10).unlimited_body().build();
        assert_eq!(server.config().max_body_size, None);
    }
}
