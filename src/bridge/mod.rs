//! Request/response channel between the extension and its host.
//!
//! The [`BridgeClient`] is the only component that crosses the process
//! boundary. It is generic over a [`Transport`], which owns delivery and
//! reply correlation. Independent in-flight calls carry no ordering
//! guarantee; callers that need one must `.await` each call in turn.

pub mod channel;
mod client;
mod message;
mod request;
pub mod stream;

use std::future::Future;

pub use channel::{ChannelTransport, Envelope, HostEndpoint, channel};
pub use client::BridgeClient;
pub use message::{BridgeRequest, BridgeResponse, ErrorCode, ErrorDescriptor};
pub use request::{HostRequest, TableOperation, TablePayload};
pub use stream::StreamTransport;

use crate::error::Result;

/// Delivers a request to the host and yields its correlated reply.
///
/// Implementations return `Error::Transport` when the channel itself fails.
/// Host-level refusals travel inside the [`BridgeResponse`].
pub trait Transport: Send + Sync {
    fn send(&self, request: BridgeRequest) -> impl Future<Output = Result<BridgeResponse>> + Send;
}
