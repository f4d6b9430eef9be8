//! Asynchronous method-call boundary.
//!
//! The host sends a [`MethodCall`] to a named channel and awaits a single
//! [`MethodResponse`]. Handlers receive a [`Reply`] that is consumed by the
//! first response, so a call can never be answered twice. Work happens on
//! the handler's runtime; the host awaits the [`PendingReply`] on its own
//! execution context.
//!
//! ```text
//!  host ──MethodCall──▶ ChannelRegistry ──▶ MethodCallHandler
//!   ▲                                          │ spawn
//!   └──────────── PendingReply ◀── Reply ◀─────┘
//! ```

mod retriever;

pub use retriever::{METADATA_CHANNEL, MetadataRetriever};

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// A method invocation from the host.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    /// Argument mapping (normally a JSON object)
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// Deserialize the whole argument mapping.
    ///
    /// Malformed arguments are logged and replaced by `T::default()`.
    pub fn arguments<T: DeserializeOwned + Default>(&self) -> T {
        match serde_json::from_value(self.arguments.clone()) {
            Ok(args) => args,
            Err(e) => {
                warn!(target: "media_bridge::channel", method = %self.method, error = %e, "Malformed arguments");
                T::default()
            }
        }
    }
}

/// Outcome of a method call.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    NotImplemented,
}

impl MethodResponse {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Success(value) => Some(value),
            Self::NotImplemented => None,
        }
    }
}

/// Single-shot reply handle.
pub struct Reply {
    tx: oneshot::Sender<MethodResponse>,
}

impl Reply {
    /// Create a reply and the handle the host awaits.
    pub fn channel() -> (Reply, PendingReply) {
        let (tx, rx) = oneshot::channel();
        (Reply { tx }, PendingReply { rx })
    }

    pub fn success(self, value: Value) {
        self.send(MethodResponse::Success(value));
    }

    pub fn not_implemented(self) {
        self.send(MethodResponse::NotImplemented);
    }

    fn send(self, response: MethodResponse) {
        if self.tx.send(response).is_err() {
            debug!(target: "media_bridge::channel", "Caller stopped waiting for reply");
        }
    }
}

/// The host's side of a [`Reply`].
pub struct PendingReply {
    rx: oneshot::Receiver<MethodResponse>,
}

impl PendingReply {
    /// Wait for the response.
    ///
    /// A handler that dropped its reply without answering still yields a
    /// success with an empty mapping.
    pub async fn wait(self) -> MethodResponse {
        self.rx.await.unwrap_or_else(|_| {
            warn!(target: "media_bridge::channel", "Reply dropped without a response");
            MethodResponse::Success(Value::Object(Default::default()))
        })
    }
}

/// Handles calls arriving on one channel.
pub trait MethodCallHandler: Send + Sync {
    /// Handle `call`. Must not block; answer through `reply` exactly once.
    fn on_method_call(&self, call: MethodCall, reply: Reply);
}

/// Named channels and their handlers.
#[derive(Default)]
pub struct ChannelRegistry {
    handlers: HashMap<String, Arc<dyn MethodCallHandler>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, channel: impl Into<String>, handler: Arc<dyn MethodCallHandler>) {
        self.handlers.insert(channel.into(), handler);
    }

    /// Send a call to a channel. Unknown channels answer not-implemented.
    pub fn invoke(&self, channel: &str, call: MethodCall) -> PendingReply {
        let (reply, pending) = Reply::channel();
        match self.handlers.get(channel) {
            Some(handler) => handler.on_method_call(call, reply),
            None => {
                warn!(target: "media_bridge::channel", channel, "No handler registered");
                reply.not_implemented();
            }
        }
        pending
    }
}
