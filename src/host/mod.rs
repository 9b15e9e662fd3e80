//! Host side of the bridge.
//!
//! A real wallet host lives in another process. [`MemoryHost`] stands in for
//! it in-process: it enforces install-time [`Grants`] and serves the six
//! targets from memory.

mod grants;
mod memory;

pub use grants::{GrantSet, Grants};
pub use memory::MemoryHost;

use crate::bridge::{BridgeRequest, BridgeResponse};

/// Answers bridge requests.
pub trait Host: Send + Sync + 'static {
    fn handle(&self, request: &BridgeRequest) -> BridgeResponse;
}
