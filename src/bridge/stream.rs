//! Newline-delimited JSON transport over any byte stream.
//!
//! Every request line carries a fresh `id`; the host echoes it on the reply
//! line, and a background reader task routes replies to their callers.
//! Replies may arrive in any order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{BridgeRequest, BridgeResponse, ErrorCode, Transport};
use crate::error::{Error, Result};
use crate::host::Host;
use crate::types::Target;

#[derive(Debug, Serialize, Deserialize)]
struct WireRequest {
    id: String,
    #[serde(flatten)]
    request: BridgeRequest,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireResponse {
    id: String,
    #[serde(flatten)]
    response: BridgeResponse,
}

#[derive(Default)]
struct Pending {
    closed: bool,
    waiters: HashMap<String, oneshot::Sender<BridgeResponse>>,
}

type SharedPending = Arc<Mutex<Pending>>;

fn lock(pending: &Mutex<Pending>) -> std::sync::MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes the waiter when a call is abandoned (timeout, cancellation).
struct WaiterGuard<'a> {
    pending: &'a Mutex<Pending>,
    id: &'a str,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        lock(self.pending).waiters.remove(self.id);
    }
}

/// Extension side of a stream connection.
pub struct StreamTransport<W> {
    writer: tokio::sync::Mutex<W>,
    pending: SharedPending,
}

impl<W> StreamTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Wraps a connected stream pair and spawns the reply reader.
    ///
    /// The reader task ends when the host closes its side; every waiting and
    /// future call then fails with a transport error.
    pub fn new<R>(reader: R, writer: W) -> (Self, JoinHandle<()>)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let pending = SharedPending::default();
        let task = tokio::spawn(read_replies(reader, Arc::clone(&pending)));
        let transport = Self {
            writer: tokio::sync::Mutex::new(writer),
            pending,
        };
        (transport, task)
    }

    /// Number of requests still waiting for a reply.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        lock(&self.pending).waiters.len()
    }

    /// Shuts down the write side, which tells the host no more requests follow.
    pub async fn close(&self) -> std::io::Result<()> {
        self.writer.lock().await.shutdown().await
    }

    async fn write_line(&self, line: &[u8]) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(line).await?;
        writer.flush().await
    }
}

impl<W> Transport for StreamTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, request: BridgeRequest) -> Result<BridgeResponse> {
        let target = request.target;
        let id = Uuid::new_v4().to_string();

        let answer = {
            let mut pending = lock(&self.pending);
            if pending.closed {
                return Err(Error::transport(target, "host closed the bridge stream"));
            }
            let (reply, answer) = oneshot::channel();
            pending.waiters.insert(id.clone(), reply);
            answer
        };
        let _guard = WaiterGuard {
            pending: &self.pending,
            id: &id,
        };

        let mut line = serde_json::to_vec(&WireRequest {
            id: id.clone(),
            request,
        })?;
        line.push(b'\n');

        self.write_line(&line)
            .await
            .map_err(|e| Error::transport(target, format!("failed to write request: {e}")))?;

        answer.await.map_err(|_| {
            Error::transport(target, "host closed the bridge stream before replying")
        })
    }
}

async fn read_replies<R>(reader: R, pending: SharedPending)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => {
                let reply = match serde_json::from_str::<WireResponse>(&line) {
                    Ok(reply) => reply,
                    Err(e) => match fail_malformed(&line, &e) {
                        Some(reply) => reply,
                        None => {
                            warn!(error = %e, "discarding reply line without an id");
                            continue;
                        }
                    },
                };
                let waiter = lock(&pending).waiters.remove(&reply.id);
                match waiter {
                    Some(waiter) => {
                        let _ = waiter.send(reply.response);
                    }
                    None => debug!(id = %reply.id, "reply for a request nobody waits on"),
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "bridge stream read failed");
                break;
            }
        }
    }

    let mut pending = lock(&pending);
    pending.closed = true;
    pending.waiters.clear();
    debug!("bridge stream closed");
}

/// Host side of a stream connection: answers request lines with `host`
/// until the extension closes its side.
pub async fn serve<H, R, W>(host: Arc<H>, reader: R, mut writer: W) -> std::io::Result<()>
where
    H: Host,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<WireRequest>(&line) {
            Ok(wire) => WireResponse {
                id: wire.id,
                response: host.handle(&wire.request),
            },
            Err(e) => match reject_malformed(&line, &e) {
                Some(reply) => reply,
                None => {
                    warn!(error = %e, "discarding request line without an id");
                    continue;
                }
            },
        };

        let mut out = serde_json::to_vec(&reply).map_err(std::io::Error::other)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Turns an undecodable reply that still names its request into a failure
/// for that request's caller.
fn fail_malformed(line: &str, error: &serde_json::Error) -> Option<WireResponse> {
    let value: Value = serde_json::from_str(line).ok()?;
    let id = value.get("id")?.as_str()?.to_string();
    warn!(%id, error = %error, "malformed reply line");
    Some(WireResponse {
        id,
        response: BridgeResponse::error(
            ErrorCode::OperationFailed,
            format!("malformed reply: {error}"),
        ),
    })
}

fn reject_malformed(line: &str, error: &serde_json::Error) -> Option<WireResponse> {
    let value: Value = serde_json::from_str(line).ok()?;
    let id = value.get("id")?.as_str()?.to_string();

    let unknown_target = value
        .get("target")
        .and_then(Value::as_str)
        .filter(|t| Target::parse(t).is_none());

    let response = match unknown_target {
        Some(target) => {
            BridgeResponse::error(ErrorCode::UnknownTarget, format!("no handler for {target}"))
        }
        None => BridgeResponse::error(ErrorCode::BadRequest, format!("malformed request: {error}")),
    };
    Some(WireResponse { id, response })
}
