use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A caught ninja, stored in the `ninjazzz.catches` table.
///
/// Game-specific fields (ninja type, catch time, rewards) are kept as-is in
/// `fields` so records written by newer plugin versions survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CatchRecord {
    /// Looks up a game-specific field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Row wrapper the host uses for `db/SELECT` results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row<T> {
    pub values: T,
}

/// Connection descriptor of the host's active node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDescriptor {
    pub url: String,
    pub websocket_url: String,
}

/// The host's active signer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDescriptor {
    pub address: String,
}
