//! In-process transport backed by tokio channels.
//!
//! Each request carries its own oneshot reply slot, so correlation needs no
//! request ids. Used when the host runs in the same process, and in tests.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use super::{BridgeRequest, BridgeResponse, Transport};
use crate::error::{Error, Result};
use crate::host::Host;

/// A request waiting for the host's answer.
#[derive(Debug)]
pub struct Envelope {
    pub request: BridgeRequest,
    reply: oneshot::Sender<BridgeResponse>,
}

impl Envelope {
    /// Sends the reply back to the waiting caller.
    pub fn respond(self, response: BridgeResponse) {
        if self.reply.send(response).is_err() {
            debug!(op = %self.request.target, "caller stopped waiting before the reply");
        }
    }
}

/// Extension side of the channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: mpsc::Sender<Envelope>,
}

/// Host side of the channel.
#[derive(Debug)]
pub struct HostEndpoint {
    receiver: mpsc::Receiver<Envelope>,
}

/// Creates a connected transport/endpoint pair holding at most `buffer`
/// undelivered requests.
#[must_use]
pub fn channel(buffer: usize) -> (ChannelTransport, HostEndpoint) {
    let (sender, receiver) = mpsc::channel(buffer.max(1));
    (ChannelTransport { sender }, HostEndpoint { receiver })
}

impl Transport for ChannelTransport {
    async fn send(&self, request: BridgeRequest) -> Result<BridgeResponse> {
        let target = request.target;
        let (reply, answer) = oneshot::channel();

        self.sender
            .send(Envelope { request, reply })
            .await
            .map_err(|_| Error::transport(target, "host channel is closed"))?;

        answer
            .await
            .map_err(|_| Error::transport(target, "host dropped the request without replying"))
    }
}

impl HostEndpoint {
    /// Receives the next request, or `None` once every transport is dropped.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.receiver.recv().await
    }

    /// Answers requests with `host` until every transport is dropped.
    pub async fn serve<H: Host>(mut self, host: Arc<H>) {
        while let Some(envelope) = self.receiver.recv().await {
            let response = host.handle(&envelope.request);
            envelope.respond(response);
        }
        debug!("all bridge clients dropped, host endpoint stopping");
    }

    pub fn spawn<H: Host>(self, host: Arc<H>) -> JoinHandle<()> {
        tokio::spawn(self.serve(host))
    }
}
