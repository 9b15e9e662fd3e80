use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info};

use crate::bridge::{BridgeClient, HostRequest, Transport};
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::types::{AccountDescriptor, Address, NetworkDescriptor};

fn connection_error(url: &str, reason: impl ToString) -> Error {
    Error::Connection {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// Health report served by a node at `/node/health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeHealth {
    pub api_node: String,
    pub db: String,
}

impl NodeHealth {
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.api_node == "up" && self.db == "up"
    }
}

#[derive(Deserialize)]
struct NodeHealthResponse {
    status: NodeHealth,
}

/// Live client handle for the host's active node.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    client: Client,
    url: Url,
    websocket_url: Url,
}

impl RepositoryFactory {
    /// Builds a handle from a connection descriptor.
    ///
    /// Fails with `Error::Connection` naming the offending endpoint when a
    /// URL is malformed or uses the wrong scheme.
    pub fn connect(descriptor: &NetworkDescriptor, timeout: Duration) -> Result<Self> {
        let url = Url::parse(&descriptor.url).map_err(|e| connection_error(&descriptor.url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(connection_error(
                &descriptor.url,
                format!("unsupported scheme '{}', expected http or https", url.scheme()),
            ));
        }

        let websocket_url = Url::parse(&descriptor.websocket_url)
            .map_err(|e| connection_error(&descriptor.websocket_url, e))?;
        if !matches!(websocket_url.scheme(), "ws" | "wss") {
            return Err(connection_error(
                &descriptor.websocket_url,
                format!(
                    "unsupported scheme '{}', expected ws or wss",
                    websocket_url.scheme()
                ),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| connection_error(&descriptor.url, e))?;

        Ok(Self {
            client,
            url,
            websocket_url,
        })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn websocket_url(&self) -> &Url {
        &self.websocket_url
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Queries the node's health endpoint.
    pub async fn node_health(&self) -> Result<NodeHealth> {
        let base = self.url.as_str().trim_end_matches('/');
        let endpoint = format!("{base}/node/health");

        let resp = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| connection_error(self.url.as_str(), e))?;

        if !resp.status().is_success() {
            return Err(connection_error(
                self.url.as_str(),
                format!("node health answered with status {}", resp.status()),
            ));
        }

        let body: NodeHealthResponse = resp
            .json()
            .await
            .map_err(|e| connection_error(self.url.as_str(), e))?;
        Ok(body.status)
    }
}

/// Reads the host's active node and signer.
///
/// Nothing is cached; each call is a fresh round trip. Calls issued
/// concurrently may resolve in any order.
pub struct NetworkService<T> {
    bridge: Arc<BridgeClient<T>>,
    probe_node: bool,
    node_timeout: Duration,
}

impl<T: Transport> NetworkService<T> {
    pub fn new(bridge: Arc<BridgeClient<T>>) -> Self {
        Self::from_config(bridge, &BridgeConfig::default())
    }

    pub fn from_config(bridge: Arc<BridgeClient<T>>, config: &BridgeConfig) -> Self {
        Self {
            bridge,
            probe_node: config.probe_node,
            node_timeout: config.node_timeout,
        }
    }

    /// Resolves the active node descriptor and turns it into a client handle.
    pub async fn get_repository_factory(&self) -> Result<RepositoryFactory> {
        let descriptor: NetworkDescriptor =
            self.bridge.request_as(HostRequest::RepositoryFactory).await?;
        debug!(url = %descriptor.url, websocket_url = %descriptor.websocket_url, "node descriptor received");

        let factory = RepositoryFactory::connect(&descriptor, self.node_timeout)?;

        if self.probe_node {
            let health = factory.node_health().await?;
            if !health.is_up() {
                return Err(connection_error(
                    &descriptor.url,
                    format!("node reports apiNode={} db={}", health.api_node, health.db),
                ));
            }
            info!(url = %descriptor.url, "node is up");
        }

        Ok(factory)
    }

    /// Resolves and parses the active signer's address.
    pub async fn get_current_signer(&self) -> Result<Address> {
        let account: AccountDescriptor = self
            .bridge
            .request_as(HostRequest::CurrentSignerAddress)
            .await?;
        debug!(address = %account.address, "signer address received");
        Address::parse(&account.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(url: &str, ws: &str) -> NetworkDescriptor {
        NetworkDescriptor {
            url: url.to_string(),
            websocket_url: ws.to_string(),
        }
    }

    #[test]
    fn test_connect_valid_descriptor() {
        let factory = RepositoryFactory::connect(
            &descriptor("http://localhost:3000", "ws://localhost:3000/ws"),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(factory.url().host_str(), Some("localhost"));
        assert_eq!(factory.websocket_url().path(), "/ws");
    }

    #[test]
    fn test_connect_malformed_url_names_endpoint() {
        let err = RepositoryFactory::connect(
            &descriptor("not a url", "ws://localhost:3000/ws"),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Connection { ref url, .. } if url == "not a url"));
        assert!(err.to_string().contains("\"not a url\""));
    }

    #[test]
    fn test_connect_rejects_wrong_schemes() {
        let err = RepositoryFactory::connect(
            &descriptor("ftp://node:3000", "ws://node:3000/ws"),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(err.to_string().contains("ftp://node:3000"));

        let err = RepositoryFactory::connect(
            &descriptor("https://node:3001", "https://node:3001/ws"),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Connection { ref url, .. } if url == "https://node:3001/ws"));
    }

    #[test]
    fn test_node_health_is_up() {
        let up = NodeHealth {
            api_node: "up".to_string(),
            db: "up".to_string(),
        };
        assert!(up.is_up());
        let down = NodeHealth {
            db: "down".to_string(),
            ..up
        };
        assert!(!down.is_up());
    }
}
