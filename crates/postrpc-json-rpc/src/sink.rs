//! The writable half of the transport boundary.
//!
//! A dispatcher hands exactly one [`OutboundResponse`] to its sink per
//! session. The transport decides how that becomes a status line, headers and
//! a body.

use http::StatusCode;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::warn;

/// Content type of every response body the dispatcher produces.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A terminal response: status plus an optional JSON body.
///
/// `body` is `None` for id-less requests, which get a status line only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundResponse {
    pub status: StatusCode,
    pub body: Option<String>,
}

impl OutboundResponse {
    pub fn new(status: StatusCode, body: Option<String>) -> Self {
        Self { status, body }
    }

    pub fn blank(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn content_type(&self) -> &'static str {
        JSON_CONTENT_TYPE
    }
}

/// Receives the terminal response of a dispatch session.
pub trait ResponseSink: Send + Sync + 'static {
    fn deliver(&self, response: OutboundResponse);
}

/// Sink that forwards the response over a oneshot channel.
///
/// Dropping every clone of the session without answering drops the sender,
/// which the receiving side observes as a closed channel.
pub struct ChannelSink {
    sender: Mutex<Option<oneshot::Sender<OutboundResponse>>>,
}

impl ChannelSink {
    pub fn new() -> (Self, oneshot::Receiver<OutboundResponse>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                sender: Mutex::new(Some(sender)),
            },
            receiver,
        )
    }
}

impl ResponseSink for ChannelSink {
    fn deliver(&self, response: OutboundResponse) {
        match self.sender.lock().take() {
            Some(sender) => {
                if sender.send(response).is_err() {
                    warn!("Response receiver dropped before delivery");
                }
            }
            None => warn!("ChannelSink already delivered a response"),
        }
    }
}
