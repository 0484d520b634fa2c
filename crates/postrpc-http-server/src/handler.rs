//! HTTP request handler: routing and the bridge between hyper bodies and the
//! dispatcher.

use std::sync::Arc;

use bytes::Bytes;
use http_body::Body;
use http_body_util::{BodyExt, Full};
use hyper::header::{ALLOW, CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use tracing::{debug, error, warn};

use postrpc_json_rpc::sink::JSON_CONTENT_TYPE;
use postrpc_json_rpc::{ChannelSink, Dispatcher, MethodRegistry, OutboundResponse};

use crate::{Result, ServerConfig};

/// Routes HTTP requests and runs one dispatch session per RPC call.
#[derive(Clone)]
pub struct RpcHttpHandler {
    pub(crate) config: Arc<ServerConfig>,
    pub(crate) registry: Arc<MethodRegistry>,
}

impl RpcHttpHandler {
    pub fn new(config: ServerConfig, registry: Arc<MethodRegistry>) -> Self {
        Self {
            config: Arc::new(config),
            registry,
        }
    }

    /// Handle a single HTTP request. Never fails: every outcome is an HTTP response.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes> + Unpin + Send + 'static,
        B::Error: std::fmt::Display,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        debug!("Handling {} {}", method, path);

        if method != Method::POST {
            return self.non_rpc_response();
        }

        if !self.config.accepts_path(&path) {
            debug!("No RPC endpoint at {}", path);
            return plain_response(StatusCode::NOT_FOUND, "Not Found");
        }

        match self.dispatch(req).await {
            Ok(response) => response,
            Err(err) => {
                error!("Request handling error: {}", err);
                blank_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    async fn dispatch<B>(&self, req: Request<B>) -> Result<Response<Full<Bytes>>>
    where
        B: Body<Data = Bytes> + Unpin + Send + 'static,
        B::Error: std::fmt::Display,
    {
        let (sink, receiver) = ChannelSink::new();
        let dispatcher = Dispatcher::builder()
            .source(req.into_body().into_data_stream())
            .sink(sink)
            .registry(Arc::clone(&self.registry))
            .max_body_size(self.config.max_body_size)
            .build()?;

        let state = dispatcher.run().await;
        debug!(?state, "Dispatcher returned, awaiting response");

        // Resolves when the session answers or its last context is dropped.
        match receiver.await {
            Ok(outbound) => Ok(json_response(outbound)),
            Err(_) => {
                warn!("Session closed without a response");
                Ok(blank_response(StatusCode::INTERNAL_SERVER_ERROR))
            }
        }
    }

    fn non_rpc_response(&self) -> Response<Full<Bytes>> {
        match &self.config.greeting {
            Some(greeting) => plain_response(StatusCode::OK, greeting.clone()),
            None => {
                let mut response = plain_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
                response
                    .headers_mut()
                    .insert(ALLOW, HeaderValue::from_static("POST"));
                response
            }
        }
    }
}

fn json_response(outbound: OutboundResponse) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(
        outbound.body.map(Bytes::from).unwrap_or_default(),
    ));
    *response.status_mut() = outbound.status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    response
}

fn plain_response(status: StatusCode, text: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(text.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

fn blank_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
