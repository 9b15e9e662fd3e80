use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use crate::bridge::{BridgeClient, channel};
use crate::config::BridgeConfig;
use crate::host::MemoryHost;
use crate::manifest::PluginManifest;
use crate::services::CatchStorage;

const NINJA_TYPES: &[&str] = &["red", "blue", "black", "gold"];

/// Installs the plugin into an in-memory host, stores `count` catches for
/// `owner` through the bridge and prints the listing as JSON.
pub async fn run_simulate(owner: String, count: u32, config: Option<String>) -> anyhow::Result<()> {
    if owner.trim().is_empty() {
        anyhow::bail!("--owner cannot be empty");
    }

    let config = match config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };

    let host = Arc::new(MemoryHost::install(
        config.extension_id.clone(),
        &PluginManifest::ninjazzz(),
    )?);
    let (transport, endpoint) = channel(16);
    let server = endpoint.spawn(host);

    let bridge = Arc::new(BridgeClient::from_config(&config, transport));
    let storage = CatchStorage::from_config(Arc::clone(&bridge), &config);

    for i in 0..count {
        let mut fields = Map::new();
        fields.insert("owner".to_string(), Value::String(owner.clone()));
        fields.insert(
            "ninjaType".to_string(),
            Value::String(NINJA_TYPES[i as usize % NINJA_TYPES.len()].to_string()),
        );
        storage.create(fields).await?;
    }

    let catches = storage.list(Some(&owner)).await?;
    info!(owner = %owner, catches = catches.len(), "simulation finished");
    println!("{}", serde_json::to_string_pretty(&catches)?);

    drop(storage);
    drop(bridge);
    server.await?;
    Ok(())
}
