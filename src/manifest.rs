//! Static install-time declarations of the plugin.
//!
//! The host installer reads the manifest once to register routes, allocate
//! the declared tables and ask the user to grant the declared permissions.
//! Nothing here is mutated at runtime.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{OperationKind, PermissionDeclaration, StorageDescriptor, Target};

/// Identifier the host knows this extension by.
pub const EXTENSION_ID: &str = "@yourdlt/plugin-ninjazzz";

/// Prefix for storage keys and permission names owned by this extension.
pub const NAMESPACE: &str = "ninjazzz";

/// Table holding caught ninjas.
pub const CATCHES_TABLE: &str = "ninjazzz.catches";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    pub protected: bool,
    pub title: String,
    pub hide_from_menu: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    pub name: String,
    pub meta: RouteMeta,
    pub props: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    pub friendly_name: String,
    pub view: String,
    pub routes: Vec<Route>,
    pub storages: Vec<StorageDescriptor>,
    #[serde(default)]
    pub settings: Vec<Value>,
    pub permissions: Vec<PermissionDeclaration>,
}

impl PluginManifest {
    /// The manifest shipped with the NinjaZZZ game.
    #[must_use]
    pub fn ninjazzz() -> Self {
        Self {
            friendly_name: "NinjaZZZ (Game)".to_string(),
            view: "Dojo".to_string(),
            routes: vec![Route {
                path: "/ninjazzz".to_string(),
                name: "ninjazzz.dojo".to_string(),
                meta: RouteMeta {
                    protected: true,
                    title: "NinjaZZZ Dojo".to_string(),
                    hide_from_menu: true,
                },
                props: false,
            }],
            storages: vec![StorageDescriptor::new(
                CATCHES_TABLE,
                "id",
                "Stores NinjaZZZ that have been caught.",
            )],
            settings: Vec::new(),
            permissions: vec![
                PermissionDeclaration::new(
                    "ninjazzz.readCatches",
                    Target::DbSelect,
                    "This permission is requested to read caught ninjas for the active account.",
                ),
                PermissionDeclaration::new(
                    "ninjazzz.createCatches",
                    Target::DbInsert,
                    "This permission is requested to store caught ninjas for the active account.",
                ),
                PermissionDeclaration::new(
                    "ninjazzz.updateCatches",
                    Target::DbUpdate,
                    "This permission is requested to update information about caught ninjas for the active account.",
                ),
                PermissionDeclaration::new(
                    "ninjazzz.deleteCatches",
                    Target::DbDelete,
                    "This permission is requested to delete existing caught ninjas for the active account.",
                ),
                PermissionDeclaration::new(
                    "ninjazzz.getRepositoryFactory",
                    Target::RepositoryFactory,
                    "This permission is requested to fetch the currently active node information.",
                ),
                PermissionDeclaration::new(
                    "ninjazzz.getCurrentSignerAddress",
                    Target::CurrentSignerAddress,
                    "This permission is requested to fetch the currently active signer address.",
                ),
            ],
        }
    }

    /// Returns true if some declaration covers a call of `kind` against `target`.
    #[must_use]
    pub fn declares(&self, kind: OperationKind, target: Target) -> bool {
        self.permissions.iter().any(|p| p.covers(kind, target))
    }

    #[must_use]
    pub fn permission(&self, name: &str) -> Option<&PermissionDeclaration> {
        self.permissions.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn storage(&self, storage_key: &str) -> Option<&StorageDescriptor> {
        self.storages.iter().find(|s| s.storage_key == storage_key)
    }

    /// Checks the invariants the host installer relies on.
    pub fn validate(&self) -> Result<()> {
        if self.friendly_name.trim().is_empty() {
            return Err(Error::InvalidManifest("friendly name cannot be empty".to_string()));
        }

        let mut names = HashSet::new();
        for permission in &self.permissions {
            if !names.insert(permission.name.as_str()) {
                return Err(Error::InvalidManifest(format!(
                    "duplicate permission name '{}'",
                    permission.name
                )));
            }
            if !permission.name.starts_with(&format!("{NAMESPACE}.")) {
                return Err(Error::InvalidManifest(format!(
                    "permission name '{}' must start with '{NAMESPACE}.'",
                    permission.name
                )));
            }
            if permission.kind != permission.target.kind() {
                return Err(Error::InvalidManifest(format!(
                    "permission '{}' declares {} but {} is dispatched as {}",
                    permission.name,
                    permission.kind,
                    permission.target,
                    permission.target.kind()
                )));
            }
        }

        let mut keys = HashSet::new();
        for storage in &self.storages {
            if !keys.insert(storage.storage_key.as_str()) {
                return Err(Error::InvalidManifest(format!(
                    "duplicate storage key '{}'",
                    storage.storage_key
                )));
            }
            if !storage.is_namespaced(NAMESPACE) {
                return Err(Error::InvalidManifest(format!(
                    "storage key '{}' must start with '{NAMESPACE}.'",
                    storage.storage_key
                )));
            }
            if storage.primary_key.trim().is_empty() {
                return Err(Error::InvalidManifest(format!(
                    "storage '{}' has no primary key",
                    storage.storage_key
                )));
            }
        }

        Ok(())
    }
}
