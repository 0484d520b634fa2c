//! The server address an [`Invoker`](crate::Invoker) talks to.

use std::fmt;

use url::Url;

use crate::error::{ClientError, ClientResult};

/// An HTTP(S) endpoint, decomposed once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
    host: String,
    port: u16,
}

impl Endpoint {
    /// Parse and validate an endpoint URL.
    ///
    /// Only `http` and `https` are accepted; the port defaults to the
    /// scheme's well-known port.
    pub fn parse(endpoint: &str) -> ClientResult<Self> {
        let url = Url::parse(endpoint)
            .map_err(|e| ClientError::InvalidEndpoint(format!("Invalid URL: {}", e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidEndpoint(format!(
                "Invalid scheme for HTTP transport: {}",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| ClientError::InvalidEndpoint(format!("Missing host: {}", endpoint)))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ClientError::InvalidEndpoint(format!("Missing port: {}", endpoint)))?;

        Ok(Self { url, host, port })
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Request path, `/` when the URL has none.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
