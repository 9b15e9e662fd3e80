use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{BridgeRequest, BridgeResponse, HostRequest, Transport};
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::types::{OperationKind, Target};

/// Sends bridge calls on behalf of one extension.
///
/// The client performs no retries and no permission checks of its own;
/// the host decides whether a (kind, target) pair is granted.
pub struct BridgeClient<T> {
    extension_id: String,
    transport: T,
    timeout: Option<Duration>,
}

impl<T: Transport> BridgeClient<T> {
    pub fn new(extension_id: impl Into<String>, transport: T) -> Self {
        Self {
            extension_id: extension_id.into(),
            transport,
            timeout: None,
        }
    }

    pub fn from_config(config: &BridgeConfig, transport: T) -> Self {
        Self {
            extension_id: config.extension_id.clone(),
            transport,
            timeout: config.request_timeout,
        }
    }

    /// Bounds every round trip made through this client.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends one call and returns the host's raw reply.
    pub async fn call(
        &self,
        kind: OperationKind,
        target: Target,
        payload: Option<Value>,
    ) -> Result<Value> {
        self.dispatch(kind, target, payload, None).await
    }

    /// Like [`call`](Self::call), but gives up as soon as `cancel` fires.
    ///
    /// Cancelling only stops the wait. A request that already reached the
    /// host may still be applied.
    pub async fn call_with_cancel(
        &self,
        kind: OperationKind,
        target: Target,
        payload: Option<Value>,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        self.dispatch(kind, target, payload, Some(cancel)).await
    }

    /// Sends a typed request, deriving kind and payload from the variant.
    pub async fn request(&self, request: HostRequest) -> Result<Value> {
        let kind = request.kind();
        let target = request.target();
        self.dispatch(kind, target, request.into_payload(), None).await
    }

    pub async fn request_with_cancel(
        &self,
        request: HostRequest,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let kind = request.kind();
        let target = request.target();
        self.dispatch(kind, target, request.into_payload(), Some(cancel))
            .await
    }

    /// Sends a typed request and decodes the reply into `R`.
    pub async fn request_as<R: DeserializeOwned>(&self, request: HostRequest) -> Result<R> {
        let target = request.target();
        let value = self.request(request).await?;
        serde_json::from_value(value).map_err(|e| Error::invalid_response(target, e))
    }

    async fn dispatch(
        &self,
        kind: OperationKind,
        target: Target,
        payload: Option<Value>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Value> {
        if kind != target.kind() {
            warn!(op = %target, %kind, "operation kind does not match target, host will likely refuse");
        }

        let message = BridgeRequest {
            extension_identifier: self.extension_id.clone(),
            operation_kind: kind,
            target,
            payload,
        };

        debug!(extension_id = %self.extension_id, op = %target, %kind, "sending bridge request");

        let response = match cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(op = %target, "bridge request cancelled");
                    return Err(Error::Cancelled { target: target.to_string() });
                }
                response = self.exchange(message) => response?,
            },
            None => self.exchange(message).await?,
        };

        let result = response.into_result(target);
        if let Err(e) = &result {
            debug!(op = %target, error = %e, "bridge request rejected");
        }
        result
    }

    async fn exchange(&self, message: BridgeRequest) -> Result<BridgeResponse> {
        let target = message.target;
        match self.timeout {
            Some(after) => tokio::time::timeout(after, self.transport.send(message))
                .await
                .map_err(|_| Error::Timeout {
                    target: target.to_string(),
                    after,
                })?,
            None => self.transport.send(message).await,
        }
    }
}
