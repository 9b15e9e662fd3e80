#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ninjazzz::bridge::{BridgeClient, BridgeRequest, BridgeResponse, ChannelTransport, channel};
use ninjazzz::host::{Host, MemoryHost};
use ninjazzz::manifest::{EXTENSION_ID, PluginManifest};
use ninjazzz::types::NetworkDescriptor;
use serde_json::{Map, Value};

pub const SIGNER: &str = "TATNE7Q5BITMUTRRN6IB4I7FLSDRDWZA37JGO5Q";

/// Wraps a host and records every request it sees.
///
/// Scripted responses, when queued, are returned instead of asking the
/// inner host.
pub struct RecordingHost<H> {
    inner: H,
    requests: Mutex<Vec<BridgeRequest>>,
    scripted: Mutex<VecDeque<BridgeResponse>>,
}

impl<H: Host> RecordingHost<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            requests: Mutex::new(Vec::new()),
            scripted: Mutex::new(VecDeque::new()),
        }
    }

    pub fn script(&self, response: BridgeResponse) {
        self.scripted.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<BridgeRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> BridgeRequest {
        self.requests().pop().expect("no request recorded")
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: Host> Host for RecordingHost<H> {
    fn handle(&self, request: &BridgeRequest) -> BridgeResponse {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(response) = self.scripted.lock().unwrap().pop_front() {
            return response;
        }
        self.inner.handle(request)
    }
}

pub fn local_network() -> NetworkDescriptor {
    NetworkDescriptor {
        url: "http://localhost:3000".to_string(),
        websocket_url: "ws://localhost:3000/ws".to_string(),
    }
}

/// Host with the built-in manifest fully granted, a network and a signer.
pub fn memory_host() -> MemoryHost {
    MemoryHost::install(EXTENSION_ID, &PluginManifest::ninjazzz())
        .expect("install manifest")
        .with_network(local_network())
        .with_signer(SIGNER)
}

/// Serves `host` on an in-process channel and returns a client bound to it.
pub fn connect<H: Host>(host: Arc<H>) -> Arc<BridgeClient<ChannelTransport>> {
    let (transport, endpoint) = channel(16);
    endpoint.spawn(host);
    Arc::new(BridgeClient::new(EXTENSION_ID, transport))
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}
